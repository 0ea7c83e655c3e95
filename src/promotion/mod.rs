//! Product discounts and promotion codes: validation, the editor entities, and
//! the checkout evaluator.

pub mod entity;
pub mod error;
pub mod evaluator;
pub mod validation;

pub use entity::*;
pub use error::*;
pub use evaluator::*;
pub use validation::validate_discount;
