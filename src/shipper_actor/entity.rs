use super::actions::ShipperAction;
use super::error::ShipperError;
use crate::actor_framework::Entity;
use crate::domain::{ShipperProfile, ShipperProfileCreate, ShipperProfilePatch};

impl Entity for ShipperProfile {
    type Id = String;
    type CreateParams = ShipperProfileCreate;
    type UpdateParams = ShipperProfilePatch;
    type Action = ShipperAction;
    type ActionResult = ShipperProfile;
    type Error = ShipperError;

    fn id(&self) -> &String {
        &self.id
    }

    /// A profile is keyed by its shipper's user id.
    fn preferred_id(params: &ShipperProfileCreate) -> Option<String> {
        Some(params.user_id.clone())
    }

    fn from_create_params(id: String, params: ShipperProfileCreate) -> Result<Self, ShipperError> {
        if params.max_active_orders == 0 {
            return Err(ShipperError::ValidationError(
                "MaxActiveOrders must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: params.name,
            max_active_orders: params.max_active_orders,
            current_active_orders: 0,
            is_working: params.is_working,
        })
    }

    fn on_update(&mut self, patch: ShipperProfilePatch) -> Result<(), ShipperError> {
        if let Some(max) = patch.max_active_orders {
            if max == 0 {
                return Err(ShipperError::ValidationError(
                    "MaxActiveOrders must be at least 1".to_string(),
                ));
            }
            self.max_active_orders = max;
        }
        if let Some(working) = patch.is_working {
            self.is_working = working;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: ShipperAction) -> Result<ShipperProfile, ShipperError> {
        match action {
            ShipperAction::SetActiveOrders(count) => self.current_active_orders = count,
            ShipperAction::SetWorking(working) => self.is_working = working,
        }
        Ok(self.clone())
    }
}
