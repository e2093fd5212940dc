//! Terminal rendition of the display collaborator.

use lyricast_core::{NotificationDisplay, NotificationHandle, NotificationRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationDisplay for ConsoleDisplay {
    fn show(&self, request: NotificationRequest) -> Arc<dyn NotificationHandle> {
        println!("{} {}", request.mask_icon, request.mask_text);
        println!("  {}", request.initial_text);

        let completion = CancellationToken::new();
        let handle = Arc::new(ConsoleHandle {
            completion: completion.clone(),
        });

        // Expire once mask + overlay have elapsed, with a small grace so the
        // driver's own elapsed check observes natural completion first.
        let lifetime =
            request.mask_duration + request.overlay_duration + std::time::Duration::from_millis(500);
        tokio::spawn(async move {
            tokio::select! {
                () = completion.cancelled() => {}
                () = tokio::time::sleep(lifetime) => completion.cancel(),
            }
        });

        handle
    }
}

struct ConsoleHandle {
    completion: CancellationToken,
}

impl NotificationHandle for ConsoleHandle {
    fn post_text(&self, text: &str) {
        println!("  ♪ {text}");
    }

    fn cancel(&self) {
        self.completion.cancel();
    }

    fn completed(&self) -> CancellationToken {
        self.completion.clone()
    }
}
