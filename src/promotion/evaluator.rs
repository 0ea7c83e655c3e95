//! Checkout pricing: automatic product discounts per line, then at most one
//! promotion code against the order total or the shipping fee.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::error::PromotionError;
use crate::domain::{
    CodeTarget, DiscountType, OrderLine, PricingBreakdown, Product, ProductDiscount, Promotion,
    PromotionCode,
};

/// Amount a discount takes off `base`, capped by its maximum and by the base
/// itself. Rounded to whole dong.
pub fn discount_amount(
    discount_type: DiscountType,
    value: Decimal,
    max_discount_amount: Option<Decimal>,
    base: Decimal,
) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = match discount_type {
        DiscountType::Percent => base * value / Decimal::ONE_HUNDRED,
        DiscountType::FixedAmount => value,
    };
    let capped = match max_discount_amount {
        Some(max) => raw.min(max),
        None => raw,
    };
    capped.round_dp(0).max(Decimal::ZERO).min(base)
}

/// Live discounts covering `product`, in application order: priority ascending,
/// then id.
pub fn applicable_discounts<'a>(
    discounts: &'a [ProductDiscount],
    product: &Product,
    at: DateTime<Utc>,
) -> Vec<&'a ProductDiscount> {
    let mut matching: Vec<&ProductDiscount> = discounts
        .iter()
        .filter(|d| d.is_live(at) && d.scope.covers(&product.id, &product.category_id))
        .collect();
    matching.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
    matching
}

/// One priced checkout line and the discounts that went into it.
#[derive(Debug, Clone)]
pub struct PricedLine<'a> {
    pub line: OrderLine,
    pub applied: Vec<&'a ProductDiscount>,
}

/// Runs the stacking rules for a single line. The first applicable discount
/// always applies; a later one applies only when it and every discount already
/// applied allow product combination.
pub fn price_line<'a>(
    product: &Product,
    quantity: u32,
    discounts: &'a [ProductDiscount],
    at: DateTime<Utc>,
) -> PricedLine<'a> {
    let mut unit = product.price;
    let mut applied: Vec<&ProductDiscount> = Vec::new();

    for discount in applicable_discounts(discounts, product, at) {
        let stacks = applied.is_empty()
            || (discount.combine.product && applied.iter().all(|d| d.combine.product));
        if !stacks {
            continue;
        }
        let off = discount_amount(discount.discount_type, discount.value, discount.max_discount_amount, unit);
        unit -= off;
        applied.push(discount);
    }

    PricedLine {
        line: OrderLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            discounted_unit_price: unit,
        },
        applied,
    }
}

/// Checks a code against the product discounts already applied and returns the
/// amount it takes off its target.
pub fn apply_code(
    promotion: &Promotion,
    code: &str,
    merchandise_total: Decimal,
    shipping_fee: Decimal,
    applied: &[&ProductDiscount],
    at: DateTime<Utc>,
) -> Result<(PromotionCode, Decimal), PromotionError> {
    let found = promotion.live_code(code, at)?;
    if merchandise_total < found.min_order_value {
        return Err(PromotionError::MinOrderNotMet {
            code: found.code.clone(),
            min_order_value: found.min_order_value,
        });
    }

    let blocker = applied.iter().find(|d| match found.target {
        CodeTarget::Order => !d.combine.order,
        CodeTarget::Shipping => !d.combine.shipping,
    });
    if let Some(discount) = blocker {
        return Err(PromotionError::NotCombinable {
            code: found.code.clone(),
            discount: discount.name.clone(),
        });
    }
    // The campaign itself may refuse to stack on automatic product discounts.
    if let (false, Some(discount)) = (promotion.combine.product, applied.first()) {
        return Err(PromotionError::NotCombinable {
            code: found.code.clone(),
            discount: discount.name.clone(),
        });
    }

    let base = match found.target {
        CodeTarget::Order => merchandise_total,
        CodeTarget::Shipping => shipping_fee,
    };
    let off = discount_amount(found.discount_type, found.value, found.max_discount_amount, base);
    Ok((found.clone(), off))
}

/// Prices a whole cart. `code` pairs the promotion owning the code with the
/// code text the customer typed.
pub fn price_checkout(
    items: &[(Product, u32)],
    discounts: &[ProductDiscount],
    code: Option<(&Promotion, &str)>,
    shipping_fee: Decimal,
    at: DateTime<Utc>,
) -> Result<(Vec<OrderLine>, PricingBreakdown), PromotionError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut applied: Vec<&ProductDiscount> = Vec::new();
    let mut pricing = PricingBreakdown {
        shipping_fee,
        ..PricingBreakdown::default()
    };

    for (product, quantity) in items {
        let priced = price_line(product, *quantity, discounts, at);
        let qty = Decimal::from(*quantity);
        pricing.subtotal += priced.line.unit_price * qty;
        pricing.product_discount += (priced.line.unit_price - priced.line.discounted_unit_price) * qty;
        for discount in priced.applied {
            if !applied.iter().any(|d| d.id == discount.id) {
                applied.push(discount);
            }
        }
        lines.push(priced.line);
    }
    pricing.applied_discounts = applied.iter().map(|d| d.name.clone()).collect();

    let merchandise = pricing.subtotal - pricing.product_discount;
    if let Some((promotion, text)) = code {
        let (promo_code, off) = apply_code(promotion, text, merchandise, shipping_fee, &applied, at)?;
        match promo_code.target {
            CodeTarget::Order => pricing.order_discount = off,
            CodeTarget::Shipping => pricing.shipping_discount = off,
        }
        debug!(code = %promo_code.code, discount = %off, "Promotion code applied");
        pricing.promo_code = Some(promo_code.code);
    }

    pricing.total = (merchandise - pricing.order_discount + pricing.shipping_fee - pricing.shipping_discount)
        .max(Decimal::ZERO);
    Ok((lines, pricing))
}
