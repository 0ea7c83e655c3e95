//! Shipper assignment: picks a shipper for a confirmed order, waits for the
//! pickup confirmation, and reassigns on rejection or timeout.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
