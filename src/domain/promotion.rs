use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountType {
    Percent,
    FixedAmount,
}

/// Which products a [`ProductDiscount`] covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiscountScope {
    AllProducts,
    Products(Vec<String>),
    Categories(Vec<String>),
}

impl DiscountScope {
    pub fn covers(&self, product_id: &str, category_id: &str) -> bool {
        match self {
            DiscountScope::AllProducts => true,
            DiscountScope::Products(ids) => ids.iter().any(|id| id == product_id),
            DiscountScope::Categories(ids) => ids.iter().any(|id| id == category_id),
        }
    }
}

/// Flags controlling which other discounts may stack with a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombineFlags {
    pub order: bool,
    pub product: bool,
    pub shipping: bool,
}

/// Optional inclusive validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |s| at >= s) && self.ends_at.map_or(true, |e| at <= e)
    }
}

/// Automatic, code-less discount applied to matching products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDiscount {
    pub id: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub scope: DiscountScope,
    pub window: ActiveWindow,
    pub is_active: bool,
    /// Lower values apply first.
    pub priority: i32,
    pub combine: CombineFlags,
    /// Bumped on every edit; edits must name the version they were based on.
    pub version: u64,
}

/// Editable fields of a product discount, used for create and edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDiscountDraft {
    pub name: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub scope: DiscountScope,
    pub window: ActiveWindow,
    pub is_active: bool,
    pub priority: i32,
    pub combine: CombineFlags,
}

impl ProductDiscount {
    pub fn is_live(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.window.contains(at)
    }
}

/// What a promotion code discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeTarget {
    Order,
    Shipping,
}

/// A voucher code belonging to a [`Promotion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCode {
    pub code: String,
    pub target: CodeTarget,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_order_value: Decimal,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
}

impl PromotionCode {
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }
}

/// A voucher campaign: its window, stacking rules, and codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub window: ActiveWindow,
    pub is_active: bool,
    pub combine: CombineFlags,
    pub codes: Vec<PromotionCode>,
}

#[derive(Debug, Clone)]
pub struct PromotionCreate {
    pub name: String,
    pub window: ActiveWindow,
    pub is_active: bool,
    pub combine: CombineFlags,
    pub codes: Vec<PromotionCode>,
}

impl Promotion {
    pub fn find_code(&self, code: &str) -> Option<&PromotionCode> {
        self.codes.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }
}
