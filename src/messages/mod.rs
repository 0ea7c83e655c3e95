use tokio::sync::oneshot;

use crate::assignment::AssignmentError;
use crate::domain::{
    AssignmentRecord, FlowerVariant, FlowerVariantCreate, Product, ProductCreate, StockLine,
};
use crate::inventory_actor::{InventoryError, StockDeduction};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed message enums for the hand-written actors. Each variant includes
/// parameters and a oneshot channel for responses.

#[derive(Debug)]
pub enum InventoryRequest {
    AddProduct {
        product: ProductCreate,
        respond_to: ServiceResponse<String, InventoryError>,
    },
    AddVariant {
        variant: FlowerVariantCreate,
        respond_to: ServiceResponse<String, InventoryError>,
    },
    GetProduct {
        id: String,
        respond_to: ServiceResponse<Option<Product>, InventoryError>,
    },
    ListProducts {
        respond_to: ServiceResponse<Vec<Product>, InventoryError>,
    },
    ListVariants {
        respond_to: ServiceResponse<Vec<FlowerVariant>, InventoryError>,
    },
    VariantsByType {
        flower_type: String,
        respond_to: ServiceResponse<Vec<FlowerVariant>, InventoryError>,
    },
    RestockProduct {
        id: String,
        quantity: u32,
        respond_to: ServiceResponse<u32, InventoryError>,
    },
    RestockVariant {
        id: String,
        quantity: u32,
        respond_to: ServiceResponse<u32, InventoryError>,
    },
    /// Take product and ingredient stock for an order, all or nothing.
    DeductForOrder {
        order_id: String,
        lines: Vec<StockLine>,
        respond_to: ServiceResponse<StockDeduction, InventoryError>,
    },
    /// Return exactly what [`InventoryRequest::DeductForOrder`] took.
    ReleaseForOrder {
        order_id: String,
        respond_to: ServiceResponse<StockDeduction, InventoryError>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum AssignmentRequest {
    AssignOrder {
        order_id: String,
        respond_to: ServiceResponse<Option<String>, AssignmentError>,
    },
    ConfirmPickup {
        order_id: String,
        shipper_id: String,
        respond_to: ServiceResponse<bool, AssignmentError>,
    },
    RejectAssignment {
        order_id: String,
        shipper_id: String,
        reason: String,
        respond_to: ServiceResponse<Option<String>, AssignmentError>,
    },
    /// Drop any pending confirmation timer for an order leaving the assignment flow.
    Release {
        order_id: String,
        respond_to: ServiceResponse<(), AssignmentError>,
    },
    UpdateShipperStats {
        shipper_id: String,
        respond_to: ServiceResponse<u32, AssignmentError>,
    },
    History {
        order_id: String,
        respond_to: ServiceResponse<Vec<AssignmentRecord>, AssignmentError>,
    },
    /// Sent by a confirmation timer to the actor itself.
    TimedOut { order_id: String, shipper_id: String },
    Shutdown,
    #[cfg(test)]
    PendingTimers {
        respond_to: ServiceResponse<usize, AssignmentError>,
    },
}
