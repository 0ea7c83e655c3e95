use rust_decimal::Decimal;
use thiserror::Error;

use crate::actor_framework::FrameworkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PromotionError {
    #[error("Invalid discount: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("Discount not found: {0}")]
    NotFound(String),
    #[error("Discount was modified by someone else (expected version {expected}, found {actual})")]
    ConcurrencyConflict { expected: u64, actual: u64 },
    #[error("Promotion code not found: {0}")]
    CodeNotFound(String),
    #[error("Promotion code {0} is not active")]
    CodeInactive(String),
    #[error("Promotion code {0} has reached its usage limit")]
    CodeExhausted(String),
    #[error("Promotion code {code} requires an order of at least {min_order_value}")]
    MinOrderNotMet { code: String, min_order_value: Decimal },
    #[error("Promotion code {code} cannot be combined with discount '{discount}'")]
    NotCombinable { code: String, discount: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError<PromotionError>> for PromotionError {
    fn from(err: FrameworkError<PromotionError>) -> Self {
        match err {
            FrameworkError::Entity(e) => e,
            FrameworkError::NotFound(id) => PromotionError::NotFound(id),
            other => PromotionError::ActorCommunicationError(other.to_string()),
        }
    }
}
