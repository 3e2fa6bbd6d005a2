//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use rust_decimal::prelude::*;
use shared::order::OrderItem;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// unit_price × quantity
pub fn line_total(unit_price: f64, quantity: f64) -> Decimal {
    to_decimal(unit_price) * to_decimal(quantity)
}

/// Σ unit_price × quantity over all items
///
/// VAT is embedded in unit prices, so this is both subtotal and total.
pub fn order_total(items: &[OrderItem]) -> f64 {
    let sum: Decimal = items
        .iter()
        .map(|item| line_total(item.unit_price, item.quantity))
        .sum();
    to_f64(sum)
}

/// Apply a percentage discount: base × (1 − pct/100)
pub fn apply_discount_percent(base: f64, percent: f64) -> Decimal {
    let factor = Decimal::ONE - to_decimal(percent) / Decimal::ONE_HUNDRED;
    to_decimal(base) * factor
}

/// Clamp to ≥ 0 and round to 2 decimals
pub fn clamp_price(value: Decimal) -> f64 {
    to_f64(value.max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price: f64, quantity: f64) -> OrderItem {
        OrderItem {
            product_id: "p".into(),
            product_name: "P".into(),
            sku: None,
            quantity,
            unit_price,
            base_price: unit_price,
            total_price: 0.0,
            vat_percentage: 21.0,
        }
    }

    #[test]
    fn test_order_total_no_float_drift() {
        // 0.1 * 3 in f64 is 0.30000000000000004
        let items = vec![item(0.1, 3.0), item(10.0, 2.0)];
        assert_eq!(order_total(&items), 20.3);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
        assert_eq!(to_f64(Decimal::new(-1005, 3)), -1.01);
    }

    #[test]
    fn test_discount_and_clamp() {
        assert_eq!(clamp_price(apply_discount_percent(100.0, 20.0)), 80.0);
        assert_eq!(clamp_price(apply_discount_percent(100.0, 150.0)), 0.0);
        assert_eq!(clamp_price(apply_discount_percent(19.99, 15.0)), 16.99);
    }

    #[test]
    fn test_fractional_quantity() {
        assert_eq!(to_f64(line_total(4.5, 2.5)), 11.25);
    }
}
