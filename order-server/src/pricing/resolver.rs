//! Pricing Resolver
//!
//! Pure resolution over a rule list:
//!
//! 1. keep applicable rules (active, in window, in scope)
//! 2. sort by priority, highest first (stable)
//! 3. walk: a fixed rule sets the price and stops; a percent rule sets
//!    `base × (1 − pct/100)` and the walk continues, so the last percent rule
//!    reached wins. Percentages never stack.
//! 4. clamp at 0, round to 2 decimals

use super::matcher::is_applicable;
use crate::orders::money::{apply_discount_percent, clamp_price, to_decimal};
use shared::models::price_rule::{PriceOverrideRule, PriceResolution};

pub fn calculate_price(
    rules: &[PriceOverrideRule],
    product_id: &str,
    category_id: Option<&str>,
    customer_id: Option<&str>,
    base_price: f64,
    now: i64,
) -> PriceResolution {
    let mut candidates: Vec<&PriceOverrideRule> = rules
        .iter()
        .filter(|r| is_applicable(r, product_id, category_id, customer_id, now))
        .collect();
    candidates.sort_by_key(|r| std::cmp::Reverse(r.priority));

    let mut final_price = to_decimal(base_price);
    let mut applied_rule_id = None;

    for rule in candidates {
        if rule.rule_type.is_fixed() {
            if let Some(fixed) = rule.fixed_price {
                final_price = to_decimal(fixed);
                applied_rule_id = Some(rule.id.clone());
                break;
            }
        } else if let Some(percent) = rule.discount_percent {
            final_price = apply_discount_percent(base_price, percent);
            applied_rule_id = Some(rule.id.clone());
        }
    }

    PriceResolution {
        product_id: product_id.to_string(),
        base_price,
        final_price: clamp_price(final_price),
        applied_rule_id,
    }
}
