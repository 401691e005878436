//! UI push channel: named change events broadcast to every subscriber.

pub mod types;

pub use types::BridgeEvent;

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Single broadcast sink for bridge events.
///
/// Each subscriber owns an unbounded channel, so an accepted mutation is
/// never lost for a live subscriber. Subscribers whose receiver has been
/// dropped are pruned on the next publish.
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<BridgeEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<BridgeEvent> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber. Returns the number reached.
    pub fn publish(&self, event: BridgeEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(
            event = event.name(),
            subscribers = subscribers.len(),
            "Published bridge event"
        );
        subscribers.len()
    }

    /// Number of subscribers that were live at the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<BridgeEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
