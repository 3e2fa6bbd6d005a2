//! Price Rule Matcher
//!
//! Scope and time-window predicates for price override rules.

use shared::models::price_rule::{PriceOverrideRule, RuleType};

/// `rule_field == value`, both present
#[inline]
fn same(rule_field: &Option<String>, value: Option<&str>) -> bool {
    matches!((rule_field.as_deref(), value), (Some(a), Some(b)) if a == b)
}

/// Check if a rule's scope matches the (product, category, customer) triple
pub fn matches_scope(
    rule: &PriceOverrideRule,
    product_id: &str,
    category_id: Option<&str>,
    customer_id: Option<&str>,
) -> bool {
    match rule.rule_type {
        RuleType::ProductCustomerFixed | RuleType::ProductCustomerPercent => {
            same(&rule.product_id, Some(product_id)) && same(&rule.customer_id, customer_id)
        }
        RuleType::CategoryCustomerPercent => {
            same(&rule.category_id, category_id) && same(&rule.customer_id, customer_id)
        }
        RuleType::GlobalProductFixed | RuleType::GlobalProductPercent => {
            same(&rule.product_id, Some(product_id))
        }
        RuleType::GlobalCategoryPercent => same(&rule.category_id, category_id),
    }
}

/// `valid_from <= now` and `valid_to` unset or `>= now`
pub fn is_time_valid(rule: &PriceOverrideRule, now: i64) -> bool {
    rule.valid_from <= now && rule.valid_to.is_none_or(|to| to >= now)
}

/// Active, inside its window and in scope
pub fn is_applicable(
    rule: &PriceOverrideRule,
    product_id: &str,
    category_id: Option<&str>,
    customer_id: Option<&str>,
    now: i64,
) -> bool {
    rule.is_active
        && is_time_valid(rule, now)
        && matches_scope(rule, product_id, category_id, customer_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(rule_type: RuleType) -> PriceOverrideRule {
        PriceOverrideRule {
            id: "r".into(),
            rule_type,
            product_id: Some("p1".into()),
            category_id: Some("cat1".into()),
            customer_id: Some("c1".into()),
            fixed_price: None,
            discount_percent: Some(10.0),
            priority: 0,
            valid_from: 0,
            valid_to: None,
            is_active: true,
            description: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_product_customer_needs_both() {
        let r = rule(RuleType::ProductCustomerPercent);
        assert!(matches_scope(&r, "p1", None, Some("c1")));
        assert!(!matches_scope(&r, "p1", None, Some("c2")));
        assert!(!matches_scope(&r, "p1", None, None));
        assert!(!matches_scope(&r, "p2", None, Some("c1")));
    }

    #[test]
    fn test_category_customer() {
        let r = rule(RuleType::CategoryCustomerPercent);
        assert!(matches_scope(&r, "any", Some("cat1"), Some("c1")));
        assert!(!matches_scope(&r, "any", None, Some("c1")));
        assert!(!matches_scope(&r, "any", Some("cat1"), Some("c9")));
    }

    #[test]
    fn test_global_scopes_ignore_customer() {
        let r = rule(RuleType::GlobalProductFixed);
        assert!(matches_scope(&r, "p1", None, None));
        assert!(matches_scope(&r, "p1", None, Some("anyone")));

        let r = rule(RuleType::GlobalCategoryPercent);
        assert!(matches_scope(&r, "p9", Some("cat1"), None));
        assert!(!matches_scope(&r, "p9", Some("cat2"), None));
    }

    #[test]
    fn test_time_window_inclusive() {
        let mut r = rule(RuleType::GlobalProductPercent);
        r.valid_from = 100;
        r.valid_to = Some(200);
        assert!(!is_time_valid(&r, 99));
        assert!(is_time_valid(&r, 100));
        assert!(is_time_valid(&r, 200));
        assert!(!is_time_valid(&r, 201));

        r.valid_to = None;
        assert!(is_time_valid(&r, i64::MAX));
    }

    #[test]
    fn test_inactive_never_applies() {
        let mut r = rule(RuleType::GlobalProductPercent);
        r.is_active = false;
        assert!(!is_applicable(&r, "p1", None, None, 1));
    }
}
