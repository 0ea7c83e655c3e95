use thiserror::Error;

use crate::actor_framework::FrameworkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShipperError {
    #[error("Shipper not found: {0}")]
    NotFound(String),
    #[error("Shipper profile already exists: {0}")]
    AlreadyExists(String),
    #[error("Shipper validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError<ShipperError>> for ShipperError {
    fn from(err: FrameworkError<ShipperError>) -> Self {
        match err {
            FrameworkError::Entity(e) => e,
            FrameworkError::NotFound(id) => ShipperError::NotFound(id),
            FrameworkError::AlreadyExists(id) => ShipperError::AlreadyExists(id),
            other => ShipperError::ActorCommunicationError(other.to_string()),
        }
    }
}
