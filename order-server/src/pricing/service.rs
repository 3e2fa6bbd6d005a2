//! Price rule service
//!
//! CRUD over the rule store plus cached price calculation. Every mutation
//! clears the price cache and is audited.

use super::cache::PriceCache;
use super::error::{PricingError, PricingResult};
use super::resolver::calculate_price;
use super::storage::PriceRuleStorage;
use super::validation::{apply_update, build_rule};
use crate::audit::{AuditAction, AuditService};
use shared::models::price_rule::{
    BatchPriceRequest, PriceOverrideRule, PriceRequest, PriceResolution, PriceRuleCreate,
    PriceRuleUpdate, RuleType,
};
use std::sync::Arc;
use std::time::Duration;

const RESOURCE_PRICE_RULE: &str = "price_rule";

fn validate_price_input(product_id: &str, base_price: f64) -> PricingResult<()> {
    if product_id.trim().is_empty() {
        return Err(PricingError::InvalidRequest("product_id is required".into()));
    }
    if !base_price.is_finite() || base_price < 0.0 {
        return Err(PricingError::InvalidRequest(format!(
            "base_price must be a non-negative number, got {}",
            base_price
        )));
    }
    Ok(())
}

/// Earliest moment after `now` at which some rule starts or stops applying
fn next_validity_boundary(rules: &[PriceOverrideRule], now: i64) -> Option<i64> {
    rules
        .iter()
        .flat_map(|rule| {
            let starts = (rule.valid_from > now).then_some(rule.valid_from);
            // valid_to is inclusive
            let ends = rule.valid_to.filter(|to| *to >= now).map(|to| to + 1);
            starts.into_iter().chain(ends)
        })
        .min()
}

pub struct PriceRuleService {
    storage: PriceRuleStorage,
    cache: PriceCache,
    audit: Arc<AuditService>,
}

impl std::fmt::Debug for PriceRuleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceRuleService")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl PriceRuleService {
    pub fn new(storage: PriceRuleStorage, audit: Arc<AuditService>, cache_ttl: Duration) -> Self {
        Self {
            storage,
            cache: PriceCache::new(cache_ttl),
            audit,
        }
    }

    // ========== Rules ==========

    pub fn create(&self, payload: PriceRuleCreate, operator_id: Option<String>) -> PricingResult<PriceOverrideRule> {
        let rule = build_rule(payload, shared::util::now_millis())?;
        self.storage.put(&rule)?;
        self.cache.clear();

        tracing::info!(rule_id = %rule.id, rule_type = %rule.rule_type, priority = rule.priority, "Price rule created");
        self.audit.log(
            AuditAction::PriceRuleCreated,
            RESOURCE_PRICE_RULE,
            &rule.id,
            operator_id,
            serde_json::to_value(&rule).unwrap_or_default(),
        );
        Ok(rule)
    }

    pub fn get(&self, id: &str) -> PricingResult<PriceOverrideRule> {
        self.storage
            .get(id)?
            .ok_or_else(|| PricingError::NotFound(id.to_string()))
    }

    pub fn list(&self, rule_type: Option<RuleType>) -> PricingResult<Vec<PriceOverrideRule>> {
        Ok(self.storage.list(rule_type)?)
    }

    pub fn update(
        &self,
        id: &str,
        patch: PriceRuleUpdate,
        operator_id: Option<String>,
    ) -> PricingResult<PriceOverrideRule> {
        let mut rule = self.get(id)?;
        let before = rule.clone();
        apply_update(&mut rule, patch, shared::util::now_millis())?;
        self.storage.put(&rule)?;
        self.cache.clear();

        tracing::info!(rule_id = %id, "Price rule updated");
        self.audit.log(
            AuditAction::PriceRuleUpdated,
            RESOURCE_PRICE_RULE,
            id,
            operator_id,
            serde_json::json!({ "before": before, "after": rule }),
        );
        Ok(rule)
    }

    pub fn delete(&self, id: &str, operator_id: Option<String>) -> PricingResult<PriceOverrideRule> {
        let removed = self
            .storage
            .delete(id)?
            .ok_or_else(|| PricingError::NotFound(id.to_string()))?;
        self.cache.clear();

        tracing::info!(rule_id = %id, "Price rule deleted");
        self.audit.log(
            AuditAction::PriceRuleDeleted,
            RESOURCE_PRICE_RULE,
            id,
            operator_id,
            serde_json::to_value(&removed).unwrap_or_default(),
        );
        Ok(removed)
    }

    // ========== Pricing ==========

    /// Resolve one price (cached)
    pub fn calculate(&self, req: &PriceRequest) -> PricingResult<PriceResolution> {
        validate_price_input(&req.product_id, req.base_price)?;
        let category = req.category_id.as_deref();
        let customer = req.customer_id.as_deref();

        if let Some(hit) = self.cache.get(&req.product_id, category, customer, req.base_price) {
            return Ok(hit);
        }

        let generation = self.cache.generation();
        let rules = self.storage.list_active()?;
        let now = shared::util::now_millis();
        let resolution = calculate_price(&rules, &req.product_id, category, customer, req.base_price, now);
        let valid_for = next_validity_boundary(&rules, now)
            .map(|at| Duration::from_millis(at.saturating_sub(now).max(0) as u64));
        self.cache.insert(category, customer, &resolution, generation, valid_for);
        Ok(resolution)
    }

    /// Resolve many lines for one customer with a single rule load
    pub fn calculate_batch(&self, req: &BatchPriceRequest) -> PricingResult<Vec<PriceResolution>> {
        for line in &req.lines {
            validate_price_input(&line.product_id, line.base_price)?;
        }

        let rules = self.storage.list_active()?;
        let now = shared::util::now_millis();
        let customer = req.customer_id.as_deref();

        Ok(req
            .lines
            .iter()
            .map(|line| {
                calculate_price(
                    &rules,
                    &line.product_id,
                    line.category_id.as_deref(),
                    customer,
                    line.base_price,
                    now,
                )
            })
            .collect())
    }
}
