/// Custom actions for ShipperProfile entities.
#[derive(Debug, Clone)]
pub enum ShipperAction {
    /// Overwrites the cached active-order count with a freshly computed value.
    SetActiveOrders(u32),
    /// Start or end a shift.
    SetWorking(bool),
}
