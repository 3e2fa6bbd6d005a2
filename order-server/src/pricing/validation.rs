//! Price rule shape validation
//!
//! A rule carries exactly the scope fields its type names and exactly one
//! value: `fixed_price` for fixed variants, `discount_percent` for percent
//! variants. Scope fields the type does not use are dropped.

use super::error::{PricingError, PricingResult};
use shared::models::price_rule::{PriceOverrideRule, PriceRuleCreate, PriceRuleUpdate};

const MAX_FIXED_PRICE: f64 = 1_000_000.0;

fn invalid(msg: impl Into<String>) -> PricingError {
    PricingError::InvalidRule(msg.into())
}

fn require_scope(value: &Option<String>, field: &str, rule: &PriceOverrideRule) -> PricingResult<()> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(invalid(format!("{} requires {}", rule.rule_type, field))),
    }
}

/// Drop scope fields the rule type does not use
pub fn normalize_scope(rule: &mut PriceOverrideRule) {
    if !rule.rule_type.requires_product() {
        rule.product_id = None;
    }
    if !rule.rule_type.requires_category() {
        rule.category_id = None;
    }
    if !rule.rule_type.requires_customer() {
        rule.customer_id = None;
    }
}

pub fn validate_rule(rule: &PriceOverrideRule) -> PricingResult<()> {
    let kind = rule.rule_type;
    if kind.requires_product() {
        require_scope(&rule.product_id, "product_id", rule)?;
    }
    if kind.requires_category() {
        require_scope(&rule.category_id, "category_id", rule)?;
    }
    if kind.requires_customer() {
        require_scope(&rule.customer_id, "customer_id", rule)?;
    }

    if kind.is_fixed() {
        if rule.discount_percent.is_some() {
            return Err(invalid(format!("{} must not set discount_percent", kind)));
        }
        match rule.fixed_price {
            None => return Err(invalid(format!("{} requires fixed_price", kind))),
            Some(p) if !p.is_finite() || p < 0.0 => {
                return Err(invalid("fixed_price must be a non-negative number"));
            }
            Some(p) if p > MAX_FIXED_PRICE => {
                return Err(invalid(format!("fixed_price exceeds maximum allowed ({})", MAX_FIXED_PRICE)));
            }
            Some(_) => {}
        }
    } else {
        if rule.fixed_price.is_some() {
            return Err(invalid(format!("{} must not set fixed_price", kind)));
        }
        match rule.discount_percent {
            None => return Err(invalid(format!("{} requires discount_percent", kind))),
            Some(p) if !p.is_finite() || !(0.0..=100.0).contains(&p) => {
                return Err(invalid("discount_percent must be within 0..=100"));
            }
            Some(_) => {}
        }
    }

    if let Some(to) = rule.valid_to
        && to < rule.valid_from
    {
        return Err(invalid("valid_to must not be before valid_from"));
    }
    Ok(())
}

/// Build and validate a new rule
pub fn build_rule(payload: PriceRuleCreate, now: i64) -> PricingResult<PriceOverrideRule> {
    let mut rule = PriceOverrideRule {
        id: shared::util::new_id(),
        rule_type: payload.rule_type,
        product_id: payload.product_id,
        category_id: payload.category_id,
        customer_id: payload.customer_id,
        fixed_price: payload.fixed_price,
        discount_percent: payload.discount_percent,
        priority: payload.priority,
        valid_from: payload.valid_from.unwrap_or(now),
        valid_to: payload.valid_to,
        is_active: payload.is_active.unwrap_or(true),
        description: payload.description,
        created_at: now,
        updated_at: now,
    };
    normalize_scope(&mut rule);
    validate_rule(&rule)?;
    Ok(rule)
}

/// Apply a partial update and re-validate the result
pub fn apply_update(rule: &mut PriceOverrideRule, patch: PriceRuleUpdate, now: i64) -> PricingResult<()> {
    if patch.product_id.is_some() {
        rule.product_id = patch.product_id;
    }
    if patch.category_id.is_some() {
        rule.category_id = patch.category_id;
    }
    if patch.customer_id.is_some() {
        rule.customer_id = patch.customer_id;
    }
    if patch.fixed_price.is_some() {
        rule.fixed_price = patch.fixed_price;
    }
    if patch.discount_percent.is_some() {
        rule.discount_percent = patch.discount_percent;
    }
    if let Some(priority) = patch.priority {
        rule.priority = priority;
    }
    if let Some(from) = patch.valid_from {
        rule.valid_from = from;
    }
    if patch.valid_to.is_some() {
        rule.valid_to = patch.valid_to;
    }
    if let Some(active) = patch.is_active {
        rule.is_active = active;
    }
    if patch.description.is_some() {
        rule.description = patch.description;
    }
    rule.updated_at = now;

    normalize_scope(rule);
    validate_rule(rule)
}
