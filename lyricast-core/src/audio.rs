//! Contract for the audio output collaborator.

use crate::error::Result;
use async_trait::async_trait;
use std::io::{Read, Seek};
use tokio_util::sync::CancellationToken;

/// Byte source handed to the audio sink. Sinks parse container headers
/// themselves, so the source must be seekable.
pub trait AudioSource: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> AudioSource for T {}

/// Audio output collaborator: plays one stream to completion or cancellation.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play `source` at `volume` (in `[0.0, 1.0]`) until the stream ends or
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if playback cannot start or fails midway. The driver
    /// logs such failures and carries on; they never abort a notification.
    async fn play(
        &self,
        source: Box<dyn AudioSource>,
        volume: f32,
        cancel: CancellationToken,
    ) -> Result<()>;
}
