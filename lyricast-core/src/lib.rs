pub mod audio;
pub mod config;
pub mod display;
pub mod error;
pub mod lrc;
pub mod notify;
pub mod paths;
pub mod probe;
pub mod time;

pub use audio::{AudioSink, AudioSource};
pub use config::{AudioConfig, LyricastConfig, LyricsConfig, NotificationConfig};
pub use display::{NotificationDisplay, NotificationHandle, NotificationRequest, MASK_ICON};
pub use error::{CoreError, Result};
pub use lrc::LyricLine;
pub use notify::{LyricsNotifier, NotificationOutcome};
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use probe::{estimate_duration, probe_path, AudioFormat};
pub use time::{format_clock, DurationExt};
