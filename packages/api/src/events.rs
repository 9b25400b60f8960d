// ABOUTME: Lifecycle event definitions and fire-and-forget publishers
// ABOUTME: Broadcast-backed publisher for subscribers plus a no-op variant for quiet wiring

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

/// Default capacity for the broadcast channel
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle notification emitted by the orchestrators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ICodeEvent {
    Deployed {
        id: String,
        repository_name: String,
        git_url: String,
    },
    Undeployed {
        id: String,
    },
}

/// Fire-and-forget sink for lifecycle notifications
///
/// Publishing never fails the operation that triggered it.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &ICodeEvent);
}

/// Publisher fanning events out to broadcast subscribers
pub struct BroadcastPublisher {
    tx: broadcast::Sender<ICodeEvent>,
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ICodeEvent> {
        self.tx.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: &ICodeEvent) {
        // Log errors but don't fail - event delivery is best-effort
        if let Err(e) = self.tx.send(event.clone()) {
            // Only log if there are subscribers that should have received it
            if self.tx.receiver_count() > 0 {
                warn!("Failed to broadcast lifecycle event: {}", e);
            }
        }
    }
}

/// Publisher that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: &ICodeEvent) {}
}
