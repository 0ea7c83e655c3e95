use rust_decimal::Decimal;

use super::error::PromotionError;
use crate::domain::{ActiveWindow, DiscountScope, DiscountType, ProductDiscountDraft, PromotionCode};

fn check_window(window: &ActiveWindow, errors: &mut Vec<String>) {
    if let (Some(start), Some(end)) = (window.starts_at, window.ends_at) {
        if end <= start {
            errors.push("End date must be after start date".to_string());
        }
    }
}

fn check_value(discount_type: DiscountType, value: Decimal, errors: &mut Vec<String>) {
    if value <= Decimal::ZERO {
        errors.push("Discount value must be greater than 0".to_string());
    }
    if discount_type == DiscountType::Percent && value > Decimal::ONE_HUNDRED {
        errors.push("Percent discount cannot exceed 100".to_string());
    }
}

/// Collects every problem with a discount draft instead of stopping at the first.
pub fn validate_discount(draft: &ProductDiscountDraft) -> Result<(), PromotionError> {
    let mut errors = Vec::new();
    if draft.name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    check_window(&draft.window, &mut errors);
    check_value(draft.discount_type, draft.value, &mut errors);
    if let Some(max) = draft.max_discount_amount {
        if max <= Decimal::ZERO {
            errors.push("Max discount amount must be greater than 0".to_string());
        }
    }
    match &draft.scope {
        DiscountScope::Products(ids) if ids.is_empty() => {
            errors.push("Select at least one product".to_string());
        }
        DiscountScope::Categories(ids) if ids.is_empty() => {
            errors.push("Select at least one category".to_string());
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PromotionError::Invalid(errors))
    }
}

pub(crate) fn validate_promotion(name: &str, window: &ActiveWindow, codes: &[PromotionCode]) -> Result<(), PromotionError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    check_window(window, &mut errors);
    for (i, code) in codes.iter().enumerate() {
        if code.code.trim().is_empty() {
            errors.push(format!("Code #{} is empty", i + 1));
        }
        check_value(code.discount_type, code.value, &mut errors);
        if codes[..i].iter().any(|c| c.code.eq_ignore_ascii_case(code.code.trim())) {
            errors.push(format!("Duplicate code {}", code.code));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PromotionError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CombineFlags;
    use chrono::{TimeZone, Utc};

    fn draft() -> ProductDiscountDraft {
        ProductDiscountDraft {
            name: "Valentine".into(),
            discount_type: DiscountType::Percent,
            value: Decimal::from(10),
            max_discount_amount: None,
            scope: DiscountScope::AllProducts,
            window: ActiveWindow::default(),
            is_active: true,
            priority: 1,
            combine: CombineFlags::default(),
        }
    }

    #[test]
    fn accepts_a_plain_percent_discount() {
        assert_eq!(validate_discount(&draft()), Ok(()));
    }

    #[test]
    fn percent_over_one_hundred_is_rejected() {
        let mut d = draft();
        d.value = Decimal::from(101);
        let Err(PromotionError::Invalid(errors)) = validate_discount(&d) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors, vec!["Percent discount cannot exceed 100".to_string()]);

        d.discount_type = DiscountType::FixedAmount;
        assert_eq!(validate_discount(&d), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut d = draft();
        d.value = Decimal::ZERO;
        d.scope = DiscountScope::Categories(Vec::new());
        d.window = ActiveWindow {
            starts_at: Some(Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap()),
            ends_at: Some(Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap()),
        };
        let Err(PromotionError::Invalid(errors)) = validate_discount(&d) else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
    }
}
