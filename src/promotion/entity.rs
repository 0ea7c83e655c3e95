use chrono::{DateTime, Utc};

use super::error::PromotionError;
use super::validation::{validate_discount, validate_promotion};
use crate::actor_framework::Entity;
use crate::domain::{ActiveWindow, ProductDiscount, ProductDiscountDraft, Promotion, PromotionCode, PromotionCreate};

/// An edit of a product discount, based on the version the editor loaded.
#[derive(Debug, Clone)]
pub struct DiscountEdit {
    pub expected_version: u64,
    pub draft: ProductDiscountDraft,
}

#[derive(Debug, Clone)]
pub enum DiscountAction {
    /// Flip the active flag; returns the new value.
    ToggleActive,
}

impl Entity for ProductDiscount {
    type Id = String;
    type CreateParams = ProductDiscountDraft;
    type UpdateParams = DiscountEdit;
    type Action = DiscountAction;
    type ActionResult = bool;
    type Error = PromotionError;

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, draft: ProductDiscountDraft) -> Result<Self, PromotionError> {
        validate_discount(&draft)?;
        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            discount_type: draft.discount_type,
            value: draft.value,
            max_discount_amount: draft.max_discount_amount,
            scope: draft.scope,
            window: draft.window,
            is_active: draft.is_active,
            priority: draft.priority,
            combine: draft.combine,
            version: 1,
        })
    }

    fn on_update(&mut self, edit: DiscountEdit) -> Result<(), PromotionError> {
        if edit.expected_version != self.version {
            return Err(PromotionError::ConcurrencyConflict {
                expected: edit.expected_version,
                actual: self.version,
            });
        }
        validate_discount(&edit.draft)?;
        let draft = edit.draft;
        self.name = draft.name.trim().to_string();
        self.discount_type = draft.discount_type;
        self.value = draft.value;
        self.max_discount_amount = draft.max_discount_amount;
        self.scope = draft.scope;
        self.window = draft.window;
        self.is_active = draft.is_active;
        self.priority = draft.priority;
        self.combine = draft.combine;
        self.version += 1;
        Ok(())
    }

    fn handle_action(&mut self, action: DiscountAction) -> Result<bool, PromotionError> {
        match action {
            DiscountAction::ToggleActive => {
                self.is_active = !self.is_active;
                self.version += 1;
                Ok(self.is_active)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PromotionPatch {
    pub name: Option<String>,
    pub window: Option<ActiveWindow>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum PromotionAction {
    /// Count one use of a code at checkout; returns the code after the increment.
    RedeemCode { code: String, at: DateTime<Utc> },
    /// Give back a use counted by [`PromotionAction::RedeemCode`] when checkout
    /// failed after redeeming.
    ReleaseCode { code: String },
    AddCode(PromotionCode),
}

impl Promotion {
    pub fn is_live(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.window.contains(at)
    }

    /// The usable code named `code`, checking the promotion's window and the
    /// code's usage limit.
    pub fn live_code(&self, code: &str, at: DateTime<Utc>) -> Result<&PromotionCode, PromotionError> {
        let found = self
            .find_code(code)
            .ok_or_else(|| PromotionError::CodeNotFound(code.trim().to_string()))?;
        if !self.is_live(at) {
            return Err(PromotionError::CodeInactive(found.code.clone()));
        }
        if found.is_exhausted() {
            return Err(PromotionError::CodeExhausted(found.code.clone()));
        }
        Ok(found)
    }
}

impl Entity for Promotion {
    type Id = String;
    type CreateParams = PromotionCreate;
    type UpdateParams = PromotionPatch;
    type Action = PromotionAction;
    type ActionResult = PromotionCode;
    type Error = PromotionError;

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: PromotionCreate) -> Result<Self, PromotionError> {
        validate_promotion(&params.name, &params.window, &params.codes)?;
        Ok(Self {
            id,
            name: params.name,
            window: params.window,
            is_active: params.is_active,
            combine: params.combine,
            codes: params
                .codes
                .into_iter()
                .map(|mut c| {
                    c.code = c.code.trim().to_uppercase();
                    c
                })
                .collect(),
        })
    }

    fn on_update(&mut self, patch: PromotionPatch) -> Result<(), PromotionError> {
        let name = patch.name.unwrap_or_else(|| self.name.clone());
        let window = patch.window.unwrap_or(self.window);
        validate_promotion(&name, &window, &self.codes)?;
        self.name = name;
        self.window = window;
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: PromotionAction) -> Result<PromotionCode, PromotionError> {
        match action {
            PromotionAction::RedeemCode { code, at } => {
                let code = self.live_code(&code, at)?.code.clone();
                let entry = self
                    .codes
                    .iter_mut()
                    .find(|c| c.code == code)
                    .ok_or(PromotionError::CodeNotFound(code))?;
                entry.used_count += 1;
                Ok(entry.clone())
            }
            PromotionAction::ReleaseCode { code } => {
                let entry = self
                    .codes
                    .iter_mut()
                    .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
                    .ok_or_else(|| PromotionError::CodeNotFound(code.trim().to_string()))?;
                entry.used_count = entry.used_count.saturating_sub(1);
                Ok(entry.clone())
            }
            PromotionAction::AddCode(mut new_code) => {
                new_code.code = new_code.code.trim().to_uppercase();
                let mut codes = self.codes.clone();
                codes.push(new_code.clone());
                validate_promotion(&self.name, &self.window, &codes)?;
                self.codes = codes;
                Ok(new_code)
            }
        }
    }
}
