//! Product and flower-variant stock, owned by a single actor so the
//! check-then-decrement at order confirmation is never interleaved.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
