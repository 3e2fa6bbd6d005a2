//! Tiered price override resolution through the rule service

mod common;

use common::TestApp;
use order_server::audit::AuditAction;
use order_server::pricing::PricingError;
use shared::models::price_rule::{
    BatchPriceLine, BatchPriceRequest, PriceRequest, PriceRuleCreate, PriceRuleUpdate, RuleType,
};

fn rule(json: serde_json::Value) -> PriceRuleCreate {
    serde_json::from_value(json).expect("valid rule payload")
}

fn price(product: &str, category: Option<&str>, customer: Option<&str>, base: f64) -> PriceRequest {
    PriceRequest {
        product_id: product.into(),
        category_id: category.map(String::from),
        customer_id: customer.map(String::from),
        base_price: base,
    }
}

/// Customer fixed price above a global discount above a category discount
fn seed_tiers(app: &TestApp) {
    let pricing = &app.state.pricing;
    pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "PRODUCT_CUSTOMER_FIXED",
                "product_id": "p1",
                "customer_id": "acme",
                "fixed_price": 95.0,
                "priority": 100,
                "valid_from": 0
            })),
            None,
        )
        .unwrap();
    pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "GLOBAL_PRODUCT_PERCENT",
                "product_id": "p1",
                "discount_percent": 10.0,
                "priority": 50,
                "valid_from": 0
            })),
            None,
        )
        .unwrap();
    pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "GLOBAL_CATEGORY_PERCENT",
                "category_id": "tools",
                "discount_percent": 20.0,
                "priority": 10,
                "valid_from": 0
            })),
            None,
        )
        .unwrap();
}

#[test]
fn test_customer_fixed_price_wins_over_global_discounts() {
    let app = TestApp::new();
    seed_tiers(&app);

    let acme = app
        .state
        .pricing
        .calculate(&price("p1", Some("tools"), Some("acme"), 100.0))
        .unwrap();
    assert_eq!(acme.final_price, 95.0);
    assert_eq!(acme.base_price, 100.0);
    assert!(acme.applied_rule_id.is_some());
}

#[test]
fn test_last_percent_rule_reached_wins_without_stacking() {
    let app = TestApp::new();
    seed_tiers(&app);

    // 10% (priority 50) then 20% (priority 10): the lower-priority rule is
    // applied last, against the base price
    let other = app
        .state
        .pricing
        .calculate(&price("p1", Some("tools"), Some("other"), 100.0))
        .unwrap();
    assert_eq!(other.final_price, 80.0);

    let outside_category = app
        .state
        .pricing
        .calculate(&price("p1", None, Some("other"), 100.0))
        .unwrap();
    assert_eq!(outside_category.final_price, 90.0);
}

#[test]
fn test_no_matching_rule_returns_base_price() {
    let app = TestApp::new();
    seed_tiers(&app);

    let resolution = app
        .state
        .pricing
        .calculate(&price("p2", Some("food"), Some("acme"), 42.5))
        .unwrap();
    assert_eq!(resolution.final_price, 42.5);
    assert!(resolution.applied_rule_id.is_none());
}

#[test]
fn test_expired_and_inactive_rules_are_ignored() {
    let app = TestApp::new();
    let pricing = &app.state.pricing;
    pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "GLOBAL_PRODUCT_FIXED",
                "product_id": "p1",
                "fixed_price": 1.0,
                "priority": 10,
                "valid_from": 0,
                "valid_to": 1000
            })),
            None,
        )
        .unwrap();
    let inactive = pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "GLOBAL_PRODUCT_FIXED",
                "product_id": "p1",
                "fixed_price": 2.0,
                "priority": 5,
                "valid_from": 0,
                "is_active": false
            })),
            None,
        )
        .unwrap();

    let resolution = pricing.calculate(&price("p1", None, None, 10.0)).unwrap();
    assert_eq!(resolution.final_price, 10.0);

    pricing
        .update(
            &inactive.id,
            PriceRuleUpdate {
                is_active: Some(true),
                ..Default::default()
            },
            None,
        )
        .unwrap();
    let resolution = pricing.calculate(&price("p1", None, None, 10.0)).unwrap();
    assert_eq!(resolution.final_price, 2.0);
    assert_eq!(resolution.applied_rule_id.as_deref(), Some(inactive.id.as_str()));
}

#[test]
fn test_batch_resolves_lines_in_order() {
    let app = TestApp::new();
    seed_tiers(&app);

    let resolutions = app
        .state
        .pricing
        .calculate_batch(&BatchPriceRequest {
            customer_id: Some("acme".into()),
            lines: vec![
                BatchPriceLine {
                    product_id: "p1".into(),
                    category_id: None,
                    base_price: 100.0,
                },
                BatchPriceLine {
                    product_id: "hammer".into(),
                    category_id: Some("tools".into()),
                    base_price: 25.0,
                },
                BatchPriceLine {
                    product_id: "bread".into(),
                    category_id: Some("food".into()),
                    base_price: 3.0,
                },
            ],
        })
        .unwrap();

    let prices: Vec<f64> = resolutions.iter().map(|r| r.final_price).collect();
    assert_eq!(prices, vec![95.0, 20.0, 3.0]);
    assert_eq!(resolutions[1].product_id, "hammer");
}

#[test]
fn test_invalid_rules_are_rejected() {
    let app = TestApp::new();
    let pricing = &app.state.pricing;

    // Percent rule carrying a fixed price
    let wrong_value = pricing.create(
        rule(serde_json::json!({
            "rule_type": "GLOBAL_PRODUCT_PERCENT",
            "product_id": "p1",
            "fixed_price": 5.0
        })),
        None,
    );
    assert!(matches!(wrong_value, Err(PricingError::InvalidRule(_))));

    // Customer rule without a customer
    let missing_scope = pricing.create(
        rule(serde_json::json!({
            "rule_type": "PRODUCT_CUSTOMER_FIXED",
            "product_id": "p1",
            "fixed_price": 5.0
        })),
        None,
    );
    assert!(matches!(missing_scope, Err(PricingError::InvalidRule(_))));

    let over_hundred = pricing.create(
        rule(serde_json::json!({
            "rule_type": "GLOBAL_CATEGORY_PERCENT",
            "category_id": "tools",
            "discount_percent": 120.0
        })),
        None,
    );
    assert!(matches!(over_hundred, Err(PricingError::InvalidRule(_))));

    assert!(pricing.list(None).unwrap().is_empty());
}

#[test]
fn test_list_filters_by_rule_type() {
    let app = TestApp::new();
    seed_tiers(&app);

    assert_eq!(app.state.pricing.list(None).unwrap().len(), 3);
    let fixed = app
        .state
        .pricing
        .list(Some(RuleType::ProductCustomerFixed))
        .unwrap();
    assert_eq!(fixed.len(), 1);
    assert_eq!(fixed[0].fixed_price, Some(95.0));
}

#[test]
fn test_rule_mutations_are_audited() {
    let mut app = TestApp::new();
    let created = app
        .state
        .pricing
        .create(
            rule(serde_json::json!({
                "rule_type": "GLOBAL_PRODUCT_FIXED",
                "product_id": "p1",
                "fixed_price": 9.5
            })),
            Some("pricing-admin".into()),
        )
        .unwrap();
    app.state.pricing.delete(&created.id, Some("pricing-admin".into())).unwrap();

    let entries = app.flush_audit();
    let actions: Vec<_> = entries.iter().map(|e| e.action).collect();
    assert!(actions.contains(&AuditAction::PriceRuleCreated));
    assert!(actions.contains(&AuditAction::PriceRuleDeleted));
    assert!(entries.iter().all(|e| e.resource_id == created.id));
    assert!(entries
        .iter()
        .all(|e| e.operator_id.as_deref() == Some("pricing-admin")));
}
