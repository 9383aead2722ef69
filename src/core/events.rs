//! Order lifecycle events
//!
//! The EventBus uses `tokio::sync::broadcast` to decouple order mutations from
//! whoever wants to observe them (the log subscriber started by the server,
//! tests, future notification senders).
//!
//! ```text
//! OrderService ──▶ EventBus::publish() ──▶ broadcast channel ──▶ subscribers
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::entities::OrderStatus;

/// Something that happened to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderEvent {
    /// An order was placed and its stock reserved
    Placed {
        order_id: Uuid,
        user_id: Uuid,
        final_price: f64,
    },
    /// An admin moved an order to another status
    StatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// An order was cancelled and its stock released
    Cancelled { order_id: Uuid, by_admin: bool },
    /// An admin removed an order
    Deleted { order_id: Uuid },
}

impl OrderEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Placed { order_id, .. }
            | OrderEvent::StatusChanged { order_id, .. }
            | OrderEvent::Cancelled { order_id, .. }
            | OrderEvent::Deleted { order_id } => *order_id,
        }
    }

    /// Get the action name
    pub fn action(&self) -> &'static str {
        match self {
            OrderEvent::Placed { .. } => "placed",
            OrderEvent::StatusChanged { .. } => "status_changed",
            OrderEvent::Cancelled { .. } => "cancelled",
            OrderEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: OrderEvent,
}

impl EventEnvelope {
    pub fn new(event: OrderEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; every clone publishes to the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails; without subscribers the event is dropped. Returns the
    /// number of receivers that will see it.
    pub fn publish(&self, event: OrderEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() returns Err only if there are no receivers
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Log every event at `info` until the bus is dropped
    pub fn spawn_logger(&self) -> JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        tracing::info!(
                            event_id = %envelope.id,
                            order_id = %envelope.event.order_id(),
                            action = envelope.event.action(),
                            "order event"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "order event logger lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("EventBus closed, stopping order event logger");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
