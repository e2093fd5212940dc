//! Contract between the notification driver and the display surface.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Glyph shown beside the mask text, from the host chrome's icon font.
pub const MASK_ICON: char = '\u{e93c}';

/// A request to show one masked lyric notification.
///
/// The total on-screen time splits into an initial mask phase and the
/// content-revealing overlay phase.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub mask_text: String,
    pub mask_icon: char,
    pub mask_duration: Duration,
    pub overlay_duration: Duration,
    /// Overlay text shown until the first lyric update arrives.
    pub initial_text: String,
    /// Whether the surface should animate text transitions.
    pub enable_animation: bool,
}

/// Display collaborator: renders notifications and their lyric updates.
///
/// Implementations own their execution context and any "only one active
/// notification" policy; the driver imposes neither.
pub trait NotificationDisplay: Send + Sync {
    /// Begin showing a notification, fire-and-forget. The returned handle
    /// stays valid for the lifetime of the notification.
    fn show(&self, request: NotificationRequest) -> Arc<dyn NotificationHandle>;
}

/// Handle to one on-screen notification.
pub trait NotificationHandle: Send + Sync {
    /// Replace the overlay text. Safe to call repeatedly with the same or
    /// new text; the implementation marshals onto its own paint context.
    fn post_text(&self, text: &str);

    /// Dismiss the notification early. Safe to call after it has already
    /// completed or been cancelled.
    fn cancel(&self);

    /// Token that fires once the notification is dismissed or expires,
    /// usable as a cancellation source.
    fn completed(&self) -> CancellationToken;
}
