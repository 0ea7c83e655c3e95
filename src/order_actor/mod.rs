//! Order entity: the status state machine and its transition side effects.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
