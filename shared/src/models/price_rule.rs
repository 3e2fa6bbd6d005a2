//! Price Override Rule Model

use serde::{Deserialize, Serialize};

/// Rule type: scope (who/what it targets) plus kind (fixed or percent)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Fixed price for one product for one customer
    ProductCustomerFixed,
    /// Percent discount on one product for one customer
    ProductCustomerPercent,
    /// Percent discount on a whole category for one customer
    CategoryCustomerPercent,
    /// Fixed price for one product for everyone
    GlobalProductFixed,
    /// Percent discount on one product for everyone
    GlobalProductPercent,
    /// Percent discount on a whole category for everyone
    GlobalCategoryPercent,
}

impl RuleType {
    pub const ALL: [RuleType; 6] = [
        Self::ProductCustomerFixed,
        Self::ProductCustomerPercent,
        Self::CategoryCustomerPercent,
        Self::GlobalProductFixed,
        Self::GlobalProductPercent,
        Self::GlobalCategoryPercent,
    ];

    /// Fixed-price variants short-circuit resolution
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::ProductCustomerFixed | Self::GlobalProductFixed)
    }

    pub fn requires_product(&self) -> bool {
        matches!(
            self,
            Self::ProductCustomerFixed
                | Self::ProductCustomerPercent
                | Self::GlobalProductFixed
                | Self::GlobalProductPercent
        )
    }

    pub fn requires_category(&self) -> bool {
        matches!(
            self,
            Self::CategoryCustomerPercent | Self::GlobalCategoryPercent
        )
    }

    pub fn requires_customer(&self) -> bool {
        matches!(
            self,
            Self::ProductCustomerFixed | Self::ProductCustomerPercent | Self::CategoryCustomerPercent
        )
    }

    /// Wire name (`PRODUCT_CUSTOMER_FIXED` etc.)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductCustomerFixed => "PRODUCT_CUSTOMER_FIXED",
            Self::ProductCustomerPercent => "PRODUCT_CUSTOMER_PERCENT",
            Self::CategoryCustomerPercent => "CATEGORY_CUSTOMER_PERCENT",
            Self::GlobalProductFixed => "GLOBAL_PRODUCT_FIXED",
            Self::GlobalProductPercent => "GLOBAL_PRODUCT_PERCENT",
            Self::GlobalCategoryPercent => "GLOBAL_CATEGORY_PERCENT",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price override rule entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceOverrideRule {
    pub id: String,
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Set for fixed variants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<f64>,
    /// Set for percent variants (20 = 20% off)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    /// Higher evaluates first
    pub priority: i32,
    /// Valid from (Unix millis)
    pub valid_from: i64,
    /// Valid until (Unix millis), open-ended when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<i64>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create price rule payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRuleCreate {
    pub rule_type: RuleType,
    pub product_id: Option<String>,
    pub category_id: Option<String>,
    pub customer_id: Option<String>,
    pub fixed_price: Option<f64>,
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub priority: i32,
    /// Defaults to creation time
    pub valid_from: Option<i64>,
    pub valid_to: Option<i64>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

/// Update price rule payload
///
/// Rule type is immutable; delete and recreate to change scope kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRuleUpdate {
    pub product_id: Option<String>,
    pub category_id: Option<String>,
    pub customer_id: Option<String>,
    pub fixed_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub priority: Option<i32>,
    pub valid_from: Option<i64>,
    pub valid_to: Option<i64>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

// ============================================================================
// Pricing API
// ============================================================================

/// Single price calculation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    pub product_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub base_price: f64,
}

/// Batch price request: many lines for one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPriceRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub lines: Vec<BatchPriceLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPriceLine {
    pub product_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    pub base_price: f64,
}

/// Resolved price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceResolution {
    pub product_id: String,
    pub base_price: f64,
    pub final_price: f64,
    /// Rule that determined the final price (None = base price)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_rule_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_scope_requirements() {
        assert!(RuleType::ProductCustomerFixed.requires_product());
        assert!(RuleType::ProductCustomerFixed.requires_customer());
        assert!(!RuleType::ProductCustomerFixed.requires_category());
        assert!(RuleType::GlobalCategoryPercent.requires_category());
        assert!(!RuleType::GlobalCategoryPercent.requires_customer());
        assert!(RuleType::CategoryCustomerPercent.requires_customer());

        let fixed: Vec<_> = RuleType::ALL.iter().filter(|t| t.is_fixed()).collect();
        assert_eq!(fixed.len(), 2);
    }

    #[test]
    fn test_rule_type_serde() {
        let json = serde_json::to_string(&RuleType::GlobalProductPercent).unwrap();
        assert_eq!(json, "\"GLOBAL_PRODUCT_PERCENT\"");
        for t in RuleType::ALL {
            let s = format!("\"{}\"", t);
            let parsed: RuleType = serde_json::from_str(&s).unwrap();
            assert_eq!(parsed, t);
        }
    }
}
