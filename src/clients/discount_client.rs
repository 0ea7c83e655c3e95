use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{ProductDiscount, ProductDiscountDraft, Promotion, PromotionCode, PromotionCreate};
use crate::promotion::{DiscountAction, DiscountEdit, PromotionAction, PromotionError, PromotionPatch};

/// Editor and read side for automatic product discounts.
#[derive(Clone)]
pub struct DiscountClient {
    inner: ResourceClient<ProductDiscount>,
}

impl_basic_client!(DiscountClient, ProductDiscount, PromotionError, discount);

impl DiscountClient {
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_discount(&self, draft: ProductDiscountDraft) -> Result<String, PromotionError> {
        debug!("Sending request");
        Ok(self.inner.create(draft).await?)
    }

    /// Saves an edit made against `expected_version`. If the record changed in
    /// the meantime the edit is refused; if it was deleted in the meantime the
    /// result is `NotFound`.
    #[instrument(skip(self, draft))]
    pub async fn edit_discount(
        &self,
        id: String,
        expected_version: u64,
        draft: ProductDiscountDraft,
    ) -> Result<ProductDiscount, PromotionError> {
        debug!("Sending request");
        match self.inner.update(id.clone(), DiscountEdit { expected_version, draft }).await {
            Ok(discount) => Ok(discount),
            Err(FrameworkError::Entity(conflict @ PromotionError::ConcurrencyConflict { .. })) => {
                warn!(error = %conflict, "Edit conflict");
                match self.inner.get(id.clone()).await? {
                    Some(_) => Err(conflict),
                    None => Err(PromotionError::NotFound(id)),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the new active flag.
    #[instrument(skip(self))]
    pub async fn toggle_active(&self, id: String) -> Result<bool, PromotionError> {
        Ok(self.inner.perform_action(id, DiscountAction::ToggleActive).await?)
    }

    #[instrument(skip(self))]
    pub async fn live_discounts(&self, at: DateTime<Utc>) -> Result<Vec<ProductDiscount>, PromotionError> {
        let all = self.inner.list().await?;
        Ok(all.into_iter().filter(|d| d.is_live(at)).collect())
    }
}

#[derive(Clone)]
pub struct PromotionClient {
    inner: ResourceClient<Promotion>,
}

impl_basic_client!(PromotionClient, Promotion, PromotionError, promotion);

impl PromotionClient {
    #[instrument(skip(self, promotion), fields(name = %promotion.name))]
    pub async fn create_promotion(&self, promotion: PromotionCreate) -> Result<String, PromotionError> {
        debug!("Sending request");
        Ok(self.inner.create(promotion).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_promotion(&self, id: String, patch: PromotionPatch) -> Result<Promotion, PromotionError> {
        Ok(self.inner.update(id, patch).await?)
    }

    #[instrument(skip(self))]
    pub async fn add_code(&self, id: String, code: PromotionCode) -> Result<PromotionCode, PromotionError> {
        Ok(self.inner.perform_action(id, PromotionAction::AddCode(code)).await?)
    }

    /// The promotion that owns `code`, matched case-insensitively.
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Promotion, PromotionError> {
        self.inner
            .list()
            .await?
            .into_iter()
            .find(|p| p.find_code(code).is_some())
            .ok_or_else(|| PromotionError::CodeNotFound(code.trim().to_string()))
    }

    /// Counts one use of `code`, refusing it when the promotion is not live or
    /// the usage limit is reached.
    #[instrument(skip(self))]
    pub async fn redeem_code(&self, code: &str, at: DateTime<Utc>) -> Result<PromotionCode, PromotionError> {
        let promotion = self.find_by_code(code).await?;
        Ok(self
            .inner
            .perform_action(promotion.id, PromotionAction::RedeemCode { code: code.to_string(), at })
            .await?)
    }

    /// Undoes one [`PromotionClient::redeem_code`].
    #[instrument(skip(self))]
    pub async fn release_code(&self, code: &str) -> Result<PromotionCode, PromotionError> {
        let promotion = self.find_by_code(code).await?;
        Ok(self
            .inner
            .perform_action(promotion.id, PromotionAction::ReleaseCode { code: code.to_string() })
            .await?)
    }
}
