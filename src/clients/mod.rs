//! Typed async clients: the public surface of each actor.

#[macro_use]
mod macros;

mod assignment_client;
mod discount_client;
mod inventory_client;
mod order_client;
mod shipper_client;
mod user_client;

pub use assignment_client::AssignmentClient;
pub use discount_client::{DiscountClient, PromotionClient};
pub use inventory_client::InventoryClient;
pub use order_client::{CheckoutRequest, DeliveryProofUpload, OrderClient, OrderServices};
pub use shipper_client::ShipperClient;
pub use user_client::UserClient;
