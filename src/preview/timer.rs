use super::{PreviewController, PreviewEffect, PreviewEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

pub type SharedController = Arc<Mutex<PreviewController>>;

/// Sleep for `after`, then deliver `WakeFired { ticket }`.
///
/// Only a weak handle is held while sleeping, so a preview that was closed
/// (disposed) or dropped in the meantime is never driven. Returns the effects
/// produced by the wake, empty when it was discarded.
pub fn spawn_wake(
    controller: &SharedController,
    ticket: u64,
    after: Duration,
) -> JoinHandle<Vec<PreviewEffect>> {
    let weak = Arc::downgrade(controller);
    let token = controller
        .lock()
        .unwrap_or_else(|err| err.into_inner())
        .token();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if token.is_cancelled() {
            debug!(ticket, "Dropping escalation wake for closed preview");
            return Vec::new();
        }
        let Some(controller) = weak.upgrade() else {
            debug!(ticket, "Dropping escalation wake for released preview");
            return Vec::new();
        };
        let mut guard = controller.lock().unwrap_or_else(|err| err.into_inner());
        guard.apply(PreviewEvent::WakeFired { ticket })
    })
}
