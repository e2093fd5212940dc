//! Rodio rendition of the audio output collaborator.

use async_trait::async_trait;
use lyricast_core::{AudioSink, AudioSource, CoreError, Result};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct RodioSink;

impl RodioSink {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn play(
        &self,
        source: Box<dyn AudioSource>,
        volume: f32,
        cancel: CancellationToken,
    ) -> Result<()> {
        // The output stream is not Send; the whole pipeline lives on a
        // blocking thread that polls the cancellation token.
        let task = tokio::task::spawn_blocking(move || -> Result<()> {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                CoreError::AudioPlayback {
                    reason: e.to_string(),
                }
            })?;
            let decoded = Decoder::new(source).map_err(|e| CoreError::AudioPlayback {
                reason: e.to_string(),
            })?;

            let sink = Sink::connect_new(stream.mixer());
            sink.set_volume(volume);
            sink.append(decoded);

            while !sink.empty() {
                if cancel.is_cancelled() {
                    debug!("audio playback cancelled");
                    sink.stop();
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(())
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(CoreError::AudioPlayback {
                reason: e.to_string(),
            }),
        }
    }
}
