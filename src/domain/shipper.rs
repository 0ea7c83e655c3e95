/// Delivery capacity and availability of one shipper. Shares its id with the
/// shipper's user account.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipperProfile {
    pub id: String,
    pub name: String,
    pub max_active_orders: u32,
    /// Cached count, refreshed by the assignment service.
    pub current_active_orders: u32,
    pub is_working: bool,
}

#[derive(Debug, Clone)]
pub struct ShipperProfileCreate {
    pub user_id: String,
    pub name: String,
    pub max_active_orders: u32,
    pub is_working: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ShipperProfilePatch {
    pub max_active_orders: Option<u32>,
    pub is_working: Option<bool>,
}

impl ShipperProfile {
    pub fn has_capacity(&self) -> bool {
        self.is_working && self.current_active_orders < self.max_active_orders
    }
}
