//! LRC lyric subtitle parsing.
//!
//! Targets the common LRC dialect: `[mm:ss]` / `[mm:ss.frac]` timestamp tags
//! plus `[key:value]` metadata directives. Word-level karaoke extensions are
//! not handled.

use std::time::Duration;

/// Separator inserted between merged lines sharing a timestamp.
const MERGE_SEPARATOR: &str = " / ";

/// A single line of lyrics with its display timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub time: Duration,
    pub content: String,
}

/// Parse LRC text into an ordered lyric list.
///
/// The result is sorted ascending by time, and entries sharing an identical
/// timestamp are merged into one line joined with `" / "` in source order.
/// Unparseable lines are silently skipped; this function never fails.
///
/// An `[offset:ms]` directive (signed milliseconds) shifts every timestamp
/// parsed after it, but not earlier ones. Negative offsets saturate at zero.
#[must_use]
pub fn parse(text: &str) -> Vec<LyricLine> {
    // Single pass carrying the running offset alongside the emitted lines.
    let (_, mut parsed) = text.split(['\r', '\n']).fold(
        (0i64, Vec::new()),
        |(offset_ms, mut lines), raw| {
            let line = raw.trim();
            if line.is_empty() {
                return (offset_ms, lines);
            }

            if let Some((key, value)) = find_directive(line) {
                let offset_ms = if key.eq_ignore_ascii_case("offset") {
                    value.trim().parse::<i64>().unwrap_or(offset_ms)
                } else {
                    offset_ms
                };
                return (offset_ms, lines);
            }

            let tags = find_timestamp_tags(line);
            if tags.is_empty() {
                return (offset_ms, lines);
            }

            let content = strip_tags(line, &tags);
            for (_, _, time) in tags {
                lines.push(LyricLine {
                    time: apply_offset(time, offset_ms),
                    content: content.clone(),
                });
            }
            (offset_ms, lines)
        },
    );

    // Stable sort keeps source order for entries sharing a timestamp, so the
    // merge below concatenates in file order.
    parsed.sort_by_key(|line| line.time);

    let mut merged: Vec<LyricLine> = Vec::with_capacity(parsed.len());
    for line in parsed {
        match merged.last_mut() {
            Some(prev) if prev.time == line.time => {
                prev.content.push_str(MERGE_SEPARATOR);
                prev.content.push_str(&line.content);
            }
            _ => merged.push(line),
        }
    }
    merged
}

/// Find a `[key:value]` metadata directive anywhere in the line.
///
/// The key must be one or more ASCII letters; the value runs to the last `]`
/// in the line. Lines carrying a directive are consumed entirely, timestamps
/// and all.
fn find_directive(line: &str) -> Option<(&str, &str)> {
    let last_close = line.rfind(']')?;
    let bytes = line.as_bytes();

    for (i, &byte) in bytes.iter().enumerate() {
        if byte != b'[' {
            continue;
        }
        let key_len = line[i + 1..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        let colon = i + 1 + key_len;
        if key_len > 0 && bytes.get(colon) == Some(&b':') && last_close > colon {
            return Some((&line[i + 1..colon], &line[colon + 1..last_close]));
        }
    }
    None
}

/// Collect every `[mm:ss]` / `[mm:ss.frac]` tag in the line as
/// `(start, end, time)` byte spans (end exclusive of the closing bracket).
fn find_timestamp_tags(line: &str) -> Vec<(usize, usize, Duration)> {
    let mut tags = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            if let Some(close) = line[i + 1..].find(']') {
                let end = i + 1 + close;
                if let Some(time) = parse_timestamp(&line[i + 1..end]) {
                    tags.push((i, end + 1, time));
                    i = end + 1;
                    continue;
                }
            }
        }
        i += 1;
    }
    tags
}

/// Parse a `mm:ss` or `mm:ss.frac` tag body. Minutes and seconds are parsed
/// as floating point, matching the tag grammar `\d+:\d+(\.\d+)?`.
fn parse_timestamp(tag: &str) -> Option<Duration> {
    let (minutes, seconds) = tag.split_once(':')?;
    if !is_digits(minutes) || !is_decimal(seconds) {
        return None;
    }

    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    Duration::try_from_secs_f64(minutes * 60.0 + seconds).ok()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => is_digits(whole) && is_digits(frac),
        None => is_digits(s),
    }
}

/// Rebuild the line's text with every timestamp tag span removed.
fn strip_tags(line: &str, tags: &[(usize, usize, Duration)]) -> String {
    let mut content = String::with_capacity(line.len());
    let mut cursor = 0;
    for &(start, end, _) in tags {
        content.push_str(&line[cursor..start]);
        cursor = end;
    }
    content.push_str(&line[cursor..]);
    content.trim().to_string()
}

/// Apply a millisecond offset to a timestamp (can be negative).
fn apply_offset(time: Duration, offset_ms: i64) -> Duration {
    if offset_ms >= 0 {
        time + Duration::from_millis(offset_ms.unsigned_abs())
    } else {
        time.saturating_sub(Duration::from_millis(offset_ms.unsigned_abs()))
    }
}
