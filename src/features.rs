//! Feature modules
//!
//! Each feature module contains the core logic for a specific functionality.
//! Nothing here installs a tracing subscriber or owns a runtime; that is
//! left to the binary or embedding host.

pub mod lyrics;
pub mod settings;

pub use settings::{Settings, SettingsError};
