use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::assignment::AssignmentError;
use crate::domain::{OrderStatus, Role, ShipperStatus};

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Cannot {action} an order in status '{status}'")]
    InvalidTransition { action: &'static str, status: OrderStatus },
    #[error("Cannot {action} while shipper status is '{}'", .shipper_status.map_or("none", |s| s.label()))]
    InvalidShipperState {
        action: &'static str,
        shipper_status: Option<ShipperStatus>,
    },
    #[error("Order {order_id} is not assigned to shipper {shipper_id}")]
    NotAssignedShipper { order_id: String, shipper_id: String },
    #[error("Role {role} may not {action}")]
    Forbidden { role: Role, action: &'static str },
    #[error("Order has no items")]
    EmptyOrder,
    #[error("Proof of delivery image is required")]
    MissingProofImage,
    #[error("Invalid proof image: {0}")]
    InvalidProofImage(String),
    #[error("Cannot store proof image: {0}")]
    ProofStorage(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Pricing failed: {0}")]
    Pricing(String),
    #[error("Assignment failed: {0}")]
    Assignment(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError<OrderError>> for OrderError {
    fn from(err: FrameworkError<OrderError>) -> Self {
        match err {
            FrameworkError::Entity(e) => e,
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl From<AssignmentError> for OrderError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::Order(e) => e,
            AssignmentError::OrderNotFound(id) => OrderError::NotFound(id),
            AssignmentError::ActorCommunicationError(msg) => OrderError::ActorCommunicationError(msg),
            other => OrderError::Assignment(other.to_string()),
        }
    }
}
