//! In-process push hub. Subscribers get every event; the payload shape
//! follows the storefront's client methods.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::domain::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "args")]
pub enum ShopEvent {
    #[serde(rename = "ReceiveOrderStatusUpdate")]
    OrderStatusUpdate {
        order_id: String,
        status: String,
        shipper_id: Option<String>,
    },
    #[serde(rename = "ReceiveNotification")]
    Notification { user_id: String, message: String },
}

impl ShopEvent {
    pub fn status_update(order_id: &str, status: OrderStatus, shipper_id: Option<&str>) -> Self {
        ShopEvent::OrderStatusUpdate {
            order_id: order_id.to_string(),
            status: status.label().to_string(),
            shipper_id: shipper_id.map(str::to_string),
        }
    }

    pub fn notify(user_id: &str, message: impl Into<String>) -> Self {
        ShopEvent::Notification {
            user_id: user_id.to_string(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<ShopEvent>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.sender.subscribe()
    }

    /// Delivery is best effort: with no subscriber the event is dropped.
    pub fn publish(&self, event: ShopEvent) {
        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "Event published"),
            Err(broadcast::error::SendError(event)) => trace!(?event, "No subscribers"),
        }
    }
}
