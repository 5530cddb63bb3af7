use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events emitted after a state change has been committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Order events
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        user_id: Uuid,
        total: Decimal,
        item_count: usize,
    },
    OrderPaymentVerified {
        order_id: Uuid,
        gateway_payment_id: String,
    },

    // Cart events
    CartItemUpserted {
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        user_id: Uuid,
        cart_item_id: Uuid,
    },
    CartCleared {
        user_id: Uuid,
        removed: u64,
    },

    // Wishlist events
    WishlistToggled {
        user_id: Uuid,
        product_id: Uuid,
        in_wishlist: bool,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
}

impl Event {
    /// Stable name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderPlaced { .. } => "order.placed",
            Event::OrderPaymentVerified { .. } => "order.payment_verified",
            Event::CartItemUpserted { .. } => "cart.item_upserted",
            Event::CartItemRemoved { .. } => "cart.item_removed",
            Event::CartCleared { .. } => "cart.cleared",
            Event::WishlistToggled { .. } => "wishlist.toggled",
            Event::ProductCreated(_) => "product.created",
            Event::ProductUpdated(_) => "product.updated",
            Event::ProductDeleted(_) => "product.deleted",
        }
    }
}

/// Envelope carried on the channel so consumers can order and de-duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }

    /// Creates a bounded channel and returns both ends.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(EventEnvelope::new(event))
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when no consumer is listening.
    ///
    /// Used after a commit: the write already happened and must not be reported
    /// as failed because of the event bus.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Drains the event channel until every sender has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<EventEnvelope>) {
    info!("Starting event processing loop");

    while let Some(envelope) = rx.recv().await {
        let name = envelope.event.name();
        metrics::counter!("storefront.events.processed", 1, "event" => name);

        match &envelope.event {
            Event::OrderPlaced {
                order_id,
                order_number,
                total,
                item_count,
                ..
            } => {
                info!(
                    event_id = %envelope.id,
                    %order_id,
                    %order_number,
                    %total,
                    item_count,
                    "order placed"
                );
            }
            Event::OrderPaymentVerified {
                order_id,
                gateway_payment_id,
            } => {
                info!(event_id = %envelope.id, %order_id, %gateway_payment_id, "payment verified");
            }
            Event::ProductCreated(id) | Event::ProductUpdated(id) | Event::ProductDeleted(id) => {
                info!(event_id = %envelope.id, product_id = %id, event = name, "catalog changed");
            }
            other => {
                debug!(event_id = %envelope.id, event = name, payload = ?other, "event received");
            }
        }
    }

    info!("Event processing loop stopped");
}
