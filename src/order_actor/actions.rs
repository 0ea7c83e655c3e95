use chrono::{DateTime, Utc};

use crate::domain::{GeoPoint, Order, OrderStatus};

/// Workflow steps that move an order through its lifecycle.
///
/// Every step carries its own timestamp so the entity stays free of clocks.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Staff accepted the order; stock has already been taken by the inventory actor.
    Confirm { at: DateTime<Utc> },
    AssignShipper { shipper_id: String, at: DateTime<Utc> },
    ConfirmPickup { shipper_id: String, at: DateTime<Utc> },
    /// Shipper declined, or the confirmation window expired.
    DeclineAssignment { shipper_id: String, at: DateTime<Utc> },
    StartDelivery {
        shipper_id: String,
        location: Option<GeoPoint>,
        at: DateTime<Utc>,
    },
    CompleteDelivery {
        shipper_id: String,
        /// Stored path of the proof-of-delivery image.
        proof_image: String,
        /// For COD orders: whether the shipper collected the cash.
        cod_collected: bool,
        location: Option<GeoPoint>,
        at: DateTime<Utc>,
    },
    FailDelivery {
        shipper_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// Customer (or staff on their behalf) acknowledged receipt.
    MarkCompleted { at: DateTime<Utc> },
    Cancel { reason: String, at: DateTime<Utc> },
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::Confirm { .. } => "confirm",
            OrderAction::AssignShipper { .. } => "assign a shipper to",
            OrderAction::ConfirmPickup { .. } => "confirm pickup of",
            OrderAction::DeclineAssignment { .. } => "decline",
            OrderAction::StartDelivery { .. } => "start delivery of",
            OrderAction::CompleteDelivery { .. } => "complete delivery of",
            OrderAction::FailDelivery { .. } => "fail delivery of",
            OrderAction::MarkCompleted { .. } => "complete",
            OrderAction::Cancel { .. } => "cancel",
        }
    }
}

/// Result of an accepted [`OrderAction`].
#[derive(Debug, Clone)]
pub struct OrderTransition {
    pub previous: OrderStatus,
    pub order: Order,
    /// Set when a cancellation returned stock that confirmation had taken.
    pub stock_released: bool,
}

/// Editable order fields outside the workflow.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub note: Option<String>,
    pub delivery_point: Option<GeoPoint>,
}
