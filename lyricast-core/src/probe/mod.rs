//! Best-effort audio container duration probing.
//!
//! Reads container headers only; no samples are decoded and no attempt is
//! made to validate that the file is actually playable. Every estimate is
//! best-effort: a structural anomaly yields `Duration::ZERO`, which callers
//! must treat as "unknown" and handle with their own fallback.

mod mp3;
mod wav;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Container format hint for [`estimate_duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF/WAVE, PCM chunk layout
    Wav,
    /// MPEG audio, optionally ID3v2-tagged, CBR or VBR
    Mp3,
}

impl AudioFormat {
    /// Resolve a format hint from a file extension, if recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("wav") {
            Some(Self::Wav)
        } else if ext.eq_ignore_ascii_case("mp3") {
            Some(Self::Mp3)
        } else {
            None
        }
    }
}

/// Estimate the playable duration of `reader` interpreted as `format`.
///
/// Never fails: malformed or truncated streams yield `Duration::ZERO`.
pub fn estimate_duration<R: Read + Seek>(reader: &mut R, format: AudioFormat) -> Duration {
    let estimate = match format {
        AudioFormat::Wav => wav::duration(reader),
        AudioFormat::Mp3 => mp3::duration(reader),
    };
    estimate.unwrap_or(Duration::ZERO)
}

/// Probe the file at `path`, resolving the format from its extension.
///
/// Unrecognized extensions, I/O failures, and malformed containers all
/// yield `Duration::ZERO`.
#[must_use]
pub fn probe_path(path: &Path) -> Duration {
    let Some(format) = AudioFormat::from_extension(path) else {
        debug!("unrecognized audio extension: {}", path.display());
        return Duration::ZERO;
    };

    match File::open(path) {
        Ok(file) => estimate_duration(&mut BufReader::new(file), format),
        Err(e) => {
            debug!("failed to open {}: {e}", path.display());
            Duration::ZERO
        }
    }
}
