//! Settings persistence
//!
//! Handles saving and loading engine and provider preferences.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::lyrics::engine::{SampledTimingPolicy, SyncEngineConfig};

/// Default lyrics service
pub const DEFAULT_BASE_URL: &str = "https://paxsenix.alwaysdata.net/";

/// Persisted settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Playback and animation settings
    #[serde(default)]
    pub playback: PlaybackSettings,
    /// Line vs syllable timing heuristic
    #[serde(default)]
    pub granularity: SampledTimingPolicy,
    /// Lyrics provider settings
    #[serde(default)]
    pub provider: ProviderSettings,
}

/// Playback-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Keep the active line centered
    #[serde(default = "default_true")]
    pub auto_scroll: bool,
    /// Animate syllables between clock updates
    #[serde(default = "default_true")]
    pub interpolate: bool,
    /// Frame driver interval
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Directory of local lyric files, checked before the network
    #[serde(default)]
    pub lyrics_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_frame_interval() -> u64 {
    16
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            auto_scroll: true,
            interpolate: true,
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            lyrics_dir: None,
        }
    }
}

impl PlaybackSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lyric-sync", "LyricSync")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| match Self::load_from_file(&path) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::debug!("Using default settings ({:?}): {}", path, e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        match Self::file_path() {
            Some(path) => self.save_to_file(&path),
            None => Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            )),
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }

    /// Engine configuration derived from these settings
    pub fn engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            interpolate: self.playback.interpolate,
            auto_scroll: self.playback.auto_scroll,
            granularity: self.granularity,
        }
    }
}

/// Errors that can occur with settings
#[derive(Debug, Clone)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.playback.auto_scroll);
        assert!(settings.playback.interpolate);
        assert_eq!(settings.playback.frame_interval(), Duration::from_millis(16));
        assert_eq!(settings.granularity.sample_lines, 5);
        assert_eq!(settings.provider.base_url, DEFAULT_BASE_URL);

        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, settings);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.playback.interpolate = false;
        settings.provider.lyrics_dir = Some(dir.path().to_path_buf());
        settings.save_to_file(&path).unwrap();
        assert_eq!(Settings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"playback": {"auto_scroll": false}}"#).unwrap();
        let settings = Settings::load_from_file(&path).unwrap();
        assert!(!settings.playback.auto_scroll);
        assert!(settings.playback.interpolate);
        assert_eq!(settings.playback.frame_interval_ms, 16);
        assert_eq!(settings.granularity, SampledTimingPolicy::default());
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Settings::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(SettingsError::Io(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load_from_file(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_engine_config() {
        let mut settings = Settings::default();
        settings.playback.auto_scroll = false;
        let config = settings.engine_config();
        assert!(!config.auto_scroll);
        assert!(config.interpolate);
    }
}
