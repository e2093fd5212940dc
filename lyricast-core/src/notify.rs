//! The notification driver: one cancellable, lyric-synchronized session.
//!
//! A session resolves the notification's total duration (cached value, audio
//! probe, or lyric-derived fallback), splits it into mask and overlay time,
//! starts audio playback fire-and-forget, and then maps elapsed wall-clock
//! time onto the active lyric line at a fixed tick until the duration runs
//! out or the linked cancellation scope fires.

use crate::audio::{AudioSink, AudioSource};
use crate::config::LyricastConfig;
use crate::display::{NotificationDisplay, NotificationHandle, NotificationRequest, MASK_ICON};
use crate::lrc::{self, LyricLine};
use crate::probe;
use crate::time::DurationExt;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fallback total duration when nothing else resolves.
const DEFAULT_TOTAL_DURATION: Duration = Duration::from_secs(10);

/// Cap applied when the configured mask would swallow the whole notification.
const MASK_SHRINK_CAP: Duration = Duration::from_secs(3);

/// Padding appended after the final lyric timestamp when probing fails.
const LYRIC_TAIL_PADDING: Duration = Duration::from_secs(3);

/// Interval between lyric selection ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

const INITIAL_TEXT_LYRICS: &str = "Preparing playback...";
const INITIAL_TEXT_NO_LYRICS: &str = "Playing notification audio...";

/// Drives one lyric notification from start to finish.
///
/// Each [`run`](Self::run) call is an independent single-use session;
/// concurrent runs share no mutable state, and any mutual exclusion between
/// simultaneous notifications belongs to the display collaborator.
pub struct LyricsNotifier {
    config: LyricastConfig,
    display: Arc<dyn NotificationDisplay>,
    audio: Arc<dyn AudioSink>,
}

/// What a finished run resolved, for callers that persist settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationOutcome {
    /// The total duration the session ran against. Callers may cache this
    /// to skip probing on the next run.
    pub resolved_duration: Duration,
    /// Whether the session ended through its cancellation scope.
    pub cancelled: bool,
}

impl LyricsNotifier {
    #[must_use]
    pub fn new(
        config: LyricastConfig,
        display: Arc<dyn NotificationDisplay>,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            config,
            display,
            audio,
        }
    }

    /// Run one notification to completion or cancellation.
    ///
    /// This never returns an error: lyric and audio failures degrade the
    /// notification (no lyric text, fallback duration) instead of aborting
    /// it, and loop faults end the session through the display-cancel path.
    pub async fn run(&self, cancel: CancellationToken) -> NotificationOutcome {
        info!(
            audio = ?self.config.audio.path,
            lyrics = ?self.config.lyrics.path,
            "starting lyric notification"
        );

        let lyrics = self.load_lyrics();
        let total = self.resolve_total_duration(&lyrics);
        let mask = mask_duration_for(self.config.notification.mask_duration(), total);
        info!(total_ms = total.as_millis_u64(), "resolved notification duration");

        let initial_text = if lyrics.is_empty() {
            INITIAL_TEXT_NO_LYRICS
        } else {
            INITIAL_TEXT_LYRICS
        };

        let handle = self.display.show(NotificationRequest {
            mask_text: self.config.notification.mask_text.clone(),
            mask_icon: MASK_ICON,
            mask_duration: mask,
            overlay_duration: total - mask,
            initial_text: initial_text.to_string(),
            enable_animation: self.config.notification.enable_animation,
        });

        let session = PlaybackSession {
            lyrics,
            total_duration: total,
            mask_duration: mask,
            overlay_duration: total - mask,
            start_time: Instant::now(),
            cancellation: linked_token(&cancel, &handle.completed()),
        };

        self.start_audio(&session.cancellation);

        let cancelled = session.run(handle.as_ref(), initial_text).await;
        // Completing the notification releases everything tied to its scope,
        // audio playback included.
        session.cancellation.cancel();

        NotificationOutcome {
            resolved_duration: total,
            cancelled,
        }
    }

    /// Load and parse the configured lyric file. Any failure degrades to
    /// "no lyrics".
    fn load_lyrics(&self) -> Vec<LyricLine> {
        let Some(path) = self.config.lyrics.path.as_deref() else {
            return Vec::new();
        };
        if !path.exists() {
            return Vec::new();
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to read lyric file {}: {e}", path.display());
                return Vec::new();
            }
        };

        let mut lyrics = lrc::parse(&text);
        if self.config.lyrics.ignore_empty_lines {
            lyrics.retain(|line| !line.content.trim().is_empty());
        }
        lyrics
    }

    /// Resolve the session's total duration: the cached value if positive,
    /// then a container probe, then lyric timing, then a fixed default.
    fn resolve_total_duration(&self, lyrics: &[LyricLine]) -> Duration {
        let mut total = self.config.audio.cached_duration();

        if total == Duration::ZERO {
            if let Some(path) = self.config.audio.path.as_deref().filter(|p| p.exists()) {
                total = probe::probe_path(path);
                if total == Duration::ZERO {
                    warn!(
                        "probing {} failed, falling back to lyric timing",
                        path.display()
                    );
                    total = lyrics
                        .last()
                        .map_or(DEFAULT_TOTAL_DURATION, |line| line.time + LYRIC_TAIL_PADDING);
                }
            }
        }

        if total == Duration::ZERO {
            DEFAULT_TOTAL_DURATION
        } else {
            total
        }
    }

    /// Start audio playback under the session's cancellation scope without
    /// awaiting it. Failure to start is logged and never aborts the session.
    fn start_audio(&self, scope: &CancellationToken) {
        let Some(path) = self.config.audio.path.clone() else {
            return;
        };
        if !path.exists() {
            return;
        }

        let source = match File::open(&path) {
            Ok(file) => Box::new(BufReader::new(file)) as Box<dyn AudioSource>,
            Err(e) => {
                error!("failed to open audio file {}: {e}", path.display());
                return;
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let volume = self.config.audio.volume.clamp(0.0, 1.0) as f32;
        let audio = Arc::clone(&self.audio);
        let scope = scope.clone();
        tokio::spawn(async move {
            if let Err(e) = audio.play(source, volume, scope).await {
                error!("audio playback failed: {e}");
            }
        });
    }
}

/// State owned by one notification run. Single-use and non-reentrant; a
/// concurrent invocation gets its own independent session.
struct PlaybackSession {
    lyrics: Vec<LyricLine>,
    total_duration: Duration,
    mask_duration: Duration,
    overlay_duration: Duration,
    start_time: Instant,
    cancellation: CancellationToken,
}

impl PlaybackSession {
    /// Drive the tick loop. Returns true if the session ended through the
    /// cancellation scope rather than by running out its duration.
    async fn run(&self, handle: &dyn NotificationHandle, initial_text: &str) -> bool {
        debug!(
            mask_ms = self.mask_duration.as_millis_u64(),
            overlay_ms = self.overlay_duration.as_millis_u64(),
            "entering lyric display loop"
        );

        if self.lyrics.is_empty() {
            return tokio::select! {
                () = self.cancellation.cancelled() => {
                    handle.cancel();
                    true
                }
                () = tokio::time::sleep(self.total_duration) => false,
            };
        }

        let mut displayed = initial_text;
        loop {
            if self.cancellation.is_cancelled() {
                handle.cancel();
                return true;
            }

            let elapsed = self.start_time.elapsed();
            if elapsed >= self.total_duration {
                return false;
            }

            if let Some(line) = current_line(&self.lyrics, elapsed) {
                if displayed != line.content.as_str() {
                    handle.post_text(&line.content);
                    displayed = &line.content;
                }
            }

            tokio::select! {
                () = self.cancellation.cancelled() => {
                    handle.cancel();
                    return true;
                }
                () = tokio::time::sleep(TICK_INTERVAL) => {}
            }
        }
    }
}

/// The lyric entry active at `elapsed`: the greatest `time <= elapsed`, or
/// none if `elapsed` precedes the first entry.
fn current_line(lyrics: &[LyricLine], elapsed: Duration) -> Option<&LyricLine> {
    lyrics.iter().rev().find(|line| line.time <= elapsed)
}

/// Shrink the configured mask duration when it would leave no overlay time.
fn mask_duration_for(configured: Duration, total: Duration) -> Duration {
    if configured >= total {
        MASK_SHRINK_CAP.min(total / 2)
    } else {
        configured
    }
}

/// A cancellation scope that fires when either source fires.
fn linked_token(caller: &CancellationToken, completion: &CancellationToken) -> CancellationToken {
    let linked = caller.child_token();
    let trigger = linked.clone();
    let completion = completion.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = completion.cancelled() => trigger.cancel(),
            () = trigger.cancelled() => {}
        }
    });
    linked
}
