//! Push channel for state changes.

use notary_core::event::NotaryEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts [`NotaryEvent`]s to any number of subscribers.
///
/// Publishing never fails an operation: with no subscribers the event is
/// dropped, and a lagging subscriber loses the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NotaryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotaryEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: NotaryEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
