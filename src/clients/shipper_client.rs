use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{ShipperProfile, ShipperProfileCreate, ShipperProfilePatch};
use crate::shipper_actor::{ShipperAction, ShipperError};

#[derive(Clone)]
pub struct ShipperClient {
    inner: ResourceClient<ShipperProfile>,
}

impl_basic_client!(ShipperClient, ShipperProfile, ShipperError, shipper);

impl ShipperClient {
    /// The profile id is the shipper's user id.
    #[instrument(skip(self))]
    pub async fn create_shipper(&self, profile: ShipperProfileCreate) -> Result<String, ShipperError> {
        debug!("Sending request");
        Ok(self.inner.create(profile).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_shipper(&self, id: String, patch: ShipperProfilePatch) -> Result<ShipperProfile, ShipperError> {
        debug!("Sending request");
        Ok(self.inner.update(id, patch).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_active_orders(&self, id: String, count: u32) -> Result<ShipperProfile, ShipperError> {
        Ok(self.inner.perform_action(id, ShipperAction::SetActiveOrders(count)).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_working(&self, id: String, working: bool) -> Result<ShipperProfile, ShipperError> {
        Ok(self.inner.perform_action(id, ShipperAction::SetWorking(working)).await?)
    }
}
