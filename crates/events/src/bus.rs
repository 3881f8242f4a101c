//! In-process change feed backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] stands in for the data store's realtime feed: producers
//! publish after a row is committed, subscribers (the client mirror) react
//! to inserts for their own user. It is shared via `Arc<EventBus>`.

use satprep_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// A row-level change on a table the client cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A row was inserted into `notifications`.
    NotificationInserted {
        user_id: DbId,
        notification_id: DbId,
        created_at: Timestamp,
    },
}

impl ChangeEvent {
    /// The user whose data changed.
    pub fn user_id(&self) -> DbId {
        match self {
            Self::NotificationInserted { user_id, .. } => *user_id,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out change feed.
///
/// ```rust
/// use satprep_events::bus::{ChangeEvent, EventBus};
///
/// let bus = EventBus::default();
/// let rx = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// # drop(rx);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped if there are none.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
