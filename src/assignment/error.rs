use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::order_actor::OrderError;
use crate::shipper_actor::ShipperError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssignmentError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Order {order_id} cannot be assigned: {reason}")]
    NotAssignable { order_id: String, reason: String },
    #[error(transparent)]
    Order(OrderError),
    #[error(transparent)]
    Shipper(#[from] ShipperError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<OrderError> for AssignmentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => AssignmentError::OrderNotFound(id),
            OrderError::ActorCommunicationError(msg) => AssignmentError::ActorCommunicationError(msg),
            other => AssignmentError::Order(other),
        }
    }
}

impl From<FrameworkError<OrderError>> for AssignmentError {
    fn from(err: FrameworkError<OrderError>) -> Self {
        OrderError::from(err).into()
    }
}
