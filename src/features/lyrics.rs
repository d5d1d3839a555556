//! Lyrics module - data, parsing, fetching and synchronization
//!
//! - `types`: the normalized lyric document
//! - `parser`: LRC, ESLyric, TTML and Apple Music JSON adapters
//! - `provider`: local file and HTTP lyric sources
//! - `engine`: clock synchronization and syllable animation

pub mod engine;
pub mod parser;
pub mod provider;
pub mod types;

// Re-export commonly used items
pub use engine::{RenderState, SyncEngine, SyncEngineConfig, SyncUpdate};
pub use parser::{ParseError, detect_format, export_lyrics, parse_lyrics};
pub use provider::{FileLyricsProvider, HttpLyricsProvider, LyricsProvider, LyricsQuery};
pub use types::*;
