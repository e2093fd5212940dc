//! Time and duration conversion utilities.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding `u64::MAX`
    /// milliseconds would represent ~584 million years.
    fn as_millis_u64(&self) -> u64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Format a duration as a playback clock: `mm:ss`, or `hh:mm:ss` once the
/// duration reaches an hour.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_u64() {
        let duration = Duration::from_millis(1234);
        assert_eq!(duration.as_millis_u64(), 1234);
    }

    #[test]
    fn test_as_millis_u64_zero() {
        let duration = Duration::ZERO;
        assert_eq!(duration.as_millis_u64(), 0);
    }

    #[test]
    fn test_format_clock_minutes() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
        assert_eq!(format_clock(Duration::from_secs(3599)), "59:59");
    }

    #[test]
    fn test_format_clock_hours() {
        assert_eq!(format_clock(Duration::from_secs(3600)), "01:00:00");
        assert_eq!(format_clock(Duration::from_secs(3600 + 125)), "01:02:05");
    }

    #[test]
    fn test_format_clock_truncates_subsecond() {
        assert_eq!(format_clock(Duration::from_millis(1999)), "00:01");
    }
}
