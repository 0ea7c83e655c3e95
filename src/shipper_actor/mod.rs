//! Shipper profiles: capacity, availability, and the cached active-order count.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
