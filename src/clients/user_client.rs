use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{User, UserCreate, UserPatch};
use crate::user_actor::{UserAction, UserActionResult, UserError};

#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserError, user);

fn unexpected(result: UserActionResult) -> UserError {
    UserError::ActorCommunicationError(format!("Unexpected result: {:?}", result))
}

impl UserClient {
    #[instrument(skip(self))]
    pub async fn create_user(&self, user: UserCreate) -> Result<String, UserError> {
        debug!("Sending request");
        Ok(self.inner.create(user).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_user(&self, id: String, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        Ok(self.inner.update(id, patch).await?)
    }

    /// Returns the new balance.
    #[instrument(skip(self))]
    pub async fn award_points(&self, id: String, points: u64) -> Result<u64, UserError> {
        match self.inner.perform_action(id, UserAction::AwardPoints(points)).await? {
            UserActionResult::Points(total) => Ok(total),
            other => Err(unexpected(other)),
        }
    }

    /// Returns false when chat was already blocked.
    #[instrument(skip(self))]
    pub async fn block_chat(&self, id: String, reason: String, at: DateTime<Utc>) -> Result<bool, UserError> {
        match self.inner.perform_action(id, UserAction::BlockChat { reason, at }).await? {
            UserActionResult::ChatBlockChanged(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn unblock_chat(&self, id: String) -> Result<bool, UserError> {
        match self.inner.perform_action(id, UserAction::UnblockChat).await? {
            UserActionResult::ChatBlockChanged(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }
}
