//! lyric-sync - synchronized lyrics playback
//!
//! Parses time-coded lyrics from several formats, fetches them from local
//! files or an Apple Music lyrics service, and drives word-by-word highlight
//! state from a media clock.

pub mod features;

pub use features::lyrics::engine::{FrameDriver, RenderState, SyncEngine, SyncEngineConfig};
pub use features::lyrics::{LyricDocument, LyricLine, Syllable};
pub use features::{Settings, SettingsError};
