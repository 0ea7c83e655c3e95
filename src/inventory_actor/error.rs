use std::fmt;

use thiserror::Error;

/// A line item or ingredient that cannot be covered by current stock.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortage {
    pub id: String,
    pub name: String,
    pub requested: u32,
    pub available: u32,
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.name, self.requested, self.available
        )
    }
}

fn join_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Flower variant not found: {0}")]
    VariantNotFound(String),
    #[error("Insufficient stock: {}", join_shortages(.0))]
    Insufficient(Vec<Shortage>),
    #[error("Stock already deducted for order {0}")]
    AlreadyDeducted(String),
    #[error("No stock deducted for order {0}")]
    NothingToRelease(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
