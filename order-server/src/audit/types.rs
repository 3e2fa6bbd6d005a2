//! Audit log types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Audited operation (enum, not free text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ Orders ═══
    OrderCreated,
    OrderSynced,
    /// Sync attempt failed, order still PENDING_SYNC
    OrderSyncFailed,
    /// Manual retry from FAILED / PENDING_SYNC
    OrderRetryRequested,
    /// Retry ceiling reached, order is FAILED
    OrderFailed,
    OrderUpdated,
    OrderDeleted,

    // ═══ Price rules ═══
    PriceRuleCreated,
    PriceRuleUpdated,
    PriceRuleDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::OrderSynced => "order_synced",
            Self::OrderSyncFailed => "order_sync_failed",
            Self::OrderRetryRequested => "order_retry_requested",
            Self::OrderFailed => "order_failed",
            Self::OrderUpdated => "order_updated",
            Self::OrderDeleted => "order_deleted",
            Self::PriceRuleCreated => "price_rule_created",
            Self::PriceRuleUpdated => "price_rule_updated",
            Self::PriceRuleDeleted => "price_rule_deleted",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit entry (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic sequence number
    pub id: u64,
    /// Unix millis
    pub timestamp: i64,
    pub action: AuditAction,
    /// "order", "price_rule"
    pub resource_type: String,
    pub resource_id: String,
    /// None for background (worker) events
    pub operator_id: Option<String>,
    pub details: serde_json::Value,
}

/// Audit query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AuditQuery {
    /// From (Unix millis, inclusive)
    pub from: Option<i64>,
    /// To (Unix millis, inclusive)
    pub to: Option<i64>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub operator_id: Option<String>,
    #[serde(default)]
    pub offset: usize,
    /// Page size (default 50)
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 500))]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl AuditQuery {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.from.is_none_or(|from| entry.timestamp >= from)
            && self.to.is_none_or(|to| entry.timestamp <= to)
            && self.action.is_none_or(|a| entry.action == a)
            && self
                .resource_type
                .as_deref()
                .is_none_or(|t| entry.resource_type == t)
            && self
                .resource_id
                .as_deref()
                .is_none_or(|id| entry.resource_id == id)
            && self
                .operator_id
                .as_deref()
                .is_none_or(|op| entry.operator_id.as_deref() == Some(op))
    }
}

/// Audit list response
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: u64,
}
