use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LyricastConfig {
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Text shown on the mask before the overlay reveals lyrics
    #[serde(default = "default_mask_text")]
    pub mask_text: String,
    #[serde(default = "default_mask_duration_ms")]
    pub mask_duration_ms: u64,
    #[serde(default = "default_true")]
    pub enable_animation: bool,
}

fn default_mask_text() -> String {
    "Lyrics".to_string()
}

const fn default_mask_duration_ms() -> u64 {
    3000
}

const fn default_true() -> bool {
    true
}

impl NotificationConfig {
    /// Configured mask duration as a [`Duration`].
    #[must_use]
    pub const fn mask_duration(&self) -> Duration {
        Duration::from_millis(self.mask_duration_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            mask_text: default_mask_text(),
            mask_duration_ms: default_mask_duration_ms(),
            enable_animation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Path to the .wav or .mp3 file played with the notification
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Previously probed duration; 0 means "probe on the next run"
    #[serde(default)]
    pub cached_duration_ms: u64,
}

const fn default_volume() -> f64 {
    1.0
}

impl AudioConfig {
    /// Cached audio duration as a [`Duration`]; zero when unknown.
    #[must_use]
    pub const fn cached_duration(&self) -> Duration {
        Duration::from_millis(self.cached_duration_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            path: None,
            volume: default_volume(),
            cached_duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Path to the .lrc file driving the overlay text
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Drop lyric lines whose text is empty after tag removal
    #[serde(default = "default_true")]
    pub ignore_empty_lines: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            path: None,
            ignore_empty_lines: true,
        }
    }
}

impl LyricastConfig {
    /// Get the config file path (~/.config/lyricast/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template on
    /// first run, or an error if the file cannot be read or parsed.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

const CONFIG_TEMPLATE: &str = r#"# Lyricast Configuration
# ~/.config/lyricast/config.toml

[notification]
# Text shown on the notification mask before lyrics appear
mask_text = "Lyrics"
# How long the mask stays up, in milliseconds. Shrunk automatically when it
# would exceed the audio duration.
mask_duration_ms = 3000
# Whether the display surface animates text transitions
enable_animation = true

[audio]
# Path to the .wav or .mp3 file to play (optional)
# path = "/path/to/song.mp3"
# Playback volume, 0.0 to 1.0
volume = 1.0
# Probed duration cache in milliseconds; 0 means "probe on the next run"
cached_duration_ms = 0

[lyrics]
# Path to the .lrc lyric file (optional)
# path = "/path/to/song.lrc"
# Drop lyric lines whose text is empty
ignore_empty_lines = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_defaults() {
        let config = LyricastConfig::default();
        assert_eq!(config.notification.mask_text, "Lyrics");
        assert_eq!(config.notification.mask_duration(), Duration::from_secs(3));
        assert!(config.notification.enable_animation);
        assert!(config.audio.path.is_none());
        assert!((config.audio.volume - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.audio.cached_duration(), Duration::ZERO);
        assert!(config.lyrics.ignore_empty_lines);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: LyricastConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.notification.mask_text, "Lyrics");
        assert_eq!(config.notification.mask_duration_ms, 3000);
        assert!(config.audio.path.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LyricastConfig = toml::from_str(
            r#"
[audio]
path = "/music/song.mp3"
volume = 0.5
"#,
        )
        .unwrap();
        assert_eq!(config.audio.path, Some(PathBuf::from("/music/song.mp3")));
        assert!((config.audio.volume - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.notification.mask_duration_ms, 3000);
        assert!(config.lyrics.path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[notification]\nmask_text = \"Now playing\"").unwrap();
        drop(file);

        let config = LyricastConfig::load_from(&path).unwrap();
        assert_eq!(config.notification.mask_text, "Now playing");
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").unwrap();

        assert!(matches!(
            LyricastConfig::load_from(&path),
            Err(CoreError::ConfigParse(_))
        ));
    }
}
