use thiserror::Error;

use super::config::ConfigError;
use crate::inventory_actor::InventoryError;
use crate::order_actor::OrderError;
use crate::user_actor::UserError;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid chat guard settings: {0}")]
    ChatGuard(#[from] regex::Error),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error("Actor task failed: {0}")]
    TaskFailed(String),
}
