//! User accounts: profile edits, loyalty points, and chat bans.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
