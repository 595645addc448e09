//! # Event Bus
//!
//! Change notifications from services to whoever renders views.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SalesService::process_sale                                            │
//! │       │  emit(SaleAdded) emit(ProductUpdated) emit(DataChanged)        │
//! │       ▼                                                                 │
//! │  EventBus (tokio broadcast, bounded)                                   │
//! │       │                                                                 │
//! │       ├──► EventReceiver (Controller)  ── drain() after each call      │
//! │       └──► EventReceiver (tests, logs)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bus is an explicitly constructed value shared by clone. Emitting with
//! no subscribers is fine. A receiver that falls more than `capacity` events
//! behind loses the oldest ones and logs a warning.

use stockroom_core::DomainEvent;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Default number of buffered events per receiver.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        EventBus { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publishes `event` to every current subscriber.
    pub fn emit(&self, event: DomainEvent) {
        let name = event.name();
        // Err only means nobody is listening
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(event = name, receivers, "Event emitted");
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// One subscriber's queue.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Takes every event queued so far without waiting.
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event receiver lagged, oldest events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Waits for the next event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event receiver lagged, oldest events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
