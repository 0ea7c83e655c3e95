pub mod assignment;
pub mod order;
pub mod product;
pub mod promotion;
pub mod shipper;
pub mod user;

pub use assignment::*;
pub use order::*;
pub use product::*;
pub use promotion::*;
pub use shipper::*;
pub use user::*;
