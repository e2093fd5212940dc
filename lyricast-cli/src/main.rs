mod console;
mod playback;

use crate::console::ConsoleDisplay;
use crate::playback::RodioSink;
use lyricast_core::{format_clock, CoreError, LyricastConfig, LyricsNotifier};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match LyricastConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            eprintln!(
                "Created a config template at {}. Edit it and run lyricast again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Ctrl+C cancels the in-flight notification instead of killing the
    // process mid-paint.
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, cancelling notification");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {e}");
    }

    let notifier = LyricsNotifier::new(
        config,
        Arc::new(ConsoleDisplay::new()),
        Arc::new(RodioSink::new()),
    );
    let outcome = runtime.block_on(notifier.run(cancel_token));

    if outcome.cancelled {
        info!("Notification cancelled");
    } else {
        info!(
            "Notification finished after {}",
            format_clock(outcome.resolved_duration)
        );
    }
}
