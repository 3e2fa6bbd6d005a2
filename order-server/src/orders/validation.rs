//! Order input validation and item normalisation

use super::error::{OrderError, OrderResult};
use super::money::{line_total, to_f64};
use shared::error::ErrorCode;
use shared::order::{OrderItem, OrderItemInput};

/// Maximum allowed unit price (€1,000,000)
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: f64 = 1_000_000.0;
/// Maximum memo length
const MAX_MEMO_LEN: usize = 2000;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field: &str, index: usize) -> OrderResult<()> {
    if !value.is_finite() {
        return Err(OrderError::validation(
            ErrorCode::InvalidPrice,
            format!("items[{}].{} must be a finite number", index, field),
        ));
    }
    Ok(())
}

fn require_price(value: f64, field: &str, index: usize) -> OrderResult<()> {
    require_finite(value, field, index)?;
    if value < 0.0 {
        return Err(OrderError::validation(
            ErrorCode::InvalidPrice,
            format!("items[{}].{} must be non-negative, got {}", index, field, value),
        ));
    }
    if value > MAX_PRICE {
        return Err(OrderError::validation(
            ErrorCode::InvalidPrice,
            format!("items[{}].{} exceeds maximum allowed ({})", index, field, MAX_PRICE),
        ));
    }
    Ok(())
}

pub fn require_non_empty(value: &str, field: &str) -> OrderResult<()> {
    if value.trim().is_empty() {
        return Err(OrderError::validation(
            ErrorCode::RequiredField,
            format!("{} is required", field),
        ));
    }
    Ok(())
}

pub fn validate_memo(memo: Option<&str>) -> OrderResult<()> {
    if let Some(m) = memo
        && m.chars().count() > MAX_MEMO_LEN
    {
        return Err(OrderError::validation(
            ErrorCode::ValueOutOfRange,
            format!("memo exceeds {} characters", MAX_MEMO_LEN),
        ));
    }
    Ok(())
}

/// Validate client items and build stored lines
///
/// `total_price` is always recomputed; `base_price` falls back to `unit_price`.
pub fn normalize_items(items: &[OrderItemInput]) -> OrderResult<Vec<OrderItem>> {
    if items.is_empty() {
        return Err(OrderError::validation(
            ErrorCode::OrderEmpty,
            "Order must contain at least one item",
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, input)| {
            require_non_empty(&input.product_id, &format!("items[{}].product_id", i))?;

            if !input.quantity.is_finite() || input.quantity <= 0.0 {
                return Err(OrderError::validation(
                    ErrorCode::InvalidQuantity,
                    format!("items[{}].quantity must be positive, got {}", i, input.quantity),
                ));
            }
            if input.quantity > MAX_QUANTITY {
                return Err(OrderError::validation(
                    ErrorCode::InvalidQuantity,
                    format!("items[{}].quantity exceeds maximum allowed ({})", i, MAX_QUANTITY),
                ));
            }

            require_price(input.unit_price, "unit_price", i)?;
            let base_price = input.base_price.unwrap_or(input.unit_price);
            require_price(base_price, "base_price", i)?;

            let vat = input.vat_percentage.unwrap_or(0.0);
            if !vat.is_finite() || !(0.0..=100.0).contains(&vat) {
                return Err(OrderError::validation(
                    ErrorCode::ValueOutOfRange,
                    format!("items[{}].vat_percentage must be within 0..=100", i),
                ));
            }

            Ok(OrderItem {
                product_id: input.product_id.clone(),
                product_name: input.product_name.clone(),
                sku: input.sku.clone(),
                quantity: input.quantity,
                unit_price: input.unit_price,
                base_price,
                total_price: to_f64(line_total(input.unit_price, input.quantity)),
                vat_percentage: vat,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(quantity: f64, unit_price: f64) -> OrderItemInput {
        OrderItemInput {
            product_id: "p1".into(),
            product_name: "Widget".into(),
            sku: None,
            quantity,
            unit_price,
            base_price: None,
            vat_percentage: None,
        }
    }

    fn code_of(err: OrderError) -> ErrorCode {
        match err {
            OrderError::Validation { code, .. } => code,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(code_of(normalize_items(&[]).unwrap_err()), ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let err = normalize_items(&[input(0.0, 10.0)]).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidQuantity);
        let err = normalize_items(&[input(-2.0, 10.0)]).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidQuantity);
    }

    #[test]
    fn test_negative_or_nan_price_rejected() {
        let err = normalize_items(&[input(1.0, -0.01)]).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidPrice);
        let err = normalize_items(&[input(1.0, f64::NAN)]).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidPrice);
    }

    #[test]
    fn test_totals_recomputed_and_base_defaulted() {
        let items = normalize_items(&[input(2.0, 10.0)]).unwrap();
        assert_eq!(items[0].total_price, 20.0);
        assert_eq!(items[0].base_price, 10.0);
    }

    #[test]
    fn test_zero_price_allowed() {
        assert!(normalize_items(&[input(1.0, 0.0)]).is_ok());
    }

    #[test]
    fn test_memo_length() {
        assert!(validate_memo(Some("short")).is_ok());
        let long = "x".repeat(2001);
        assert!(validate_memo(Some(&long)).is_err());
    }
}
