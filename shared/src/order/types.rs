//! Order types: status, line items, the stored order and API payloads

use serde::{Deserialize, Serialize};

// ============================================================================
// Status
// ============================================================================

/// Sync lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Transient: set and immediately replaced before the first write
    #[default]
    Draft,
    /// Persisted locally, waiting for the ERP to accept it
    PendingSync,
    /// Accepted by the ERP (terminal)
    Synced,
    /// Retry ceiling reached; only a manual retry leaves this state
    Failed,
}

impl OrderStatus {
    /// Wire name (`PENDING_SYNC` etc.)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingSync => "PENDING_SYNC",
            Self::Synced => "SYNCED",
            Self::Failed => "FAILED",
        }
    }

    /// Allowed lifecycle transitions
    ///
    /// `FAILED -> PENDING_SYNC` is only reachable through a manual retry.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::PendingSync)
                | (Self::PendingSync, Self::Synced)
                | (Self::PendingSync, Self::Failed)
                | (Self::PendingSync, Self::PendingSync)
                | (Self::Failed, Self::PendingSync)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PENDING_SYNC" => Ok(Self::PendingSync),
            "SYNCED" => Ok(Self::Synced),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// Stored order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// ERP product id
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Quantity (> 0, fractional quantities allowed for weight-based goods)
    pub quantity: f64,
    /// Price actually charged per unit (VAT included)
    pub unit_price: f64,
    /// List price before customer overrides
    pub base_price: f64,
    /// unit_price × quantity, computed by the server
    pub total_price: f64,
    /// VAT percentage embedded in unit_price (e.g. 21.0)
    #[serde(default)]
    pub vat_percentage: f64,
}

/// Line item as submitted by the client
///
/// `total_price` is never accepted from the client; `base_price` defaults
/// to `unit_price` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemInput {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub vat_percentage: Option<f64>,
}

// ============================================================================
// Local Order
// ============================================================================

/// Locally persisted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalOrder {
    /// Local id (UUID v4)
    pub id: String,
    /// Client-generated de-duplication token (globally unique)
    pub idempotency_key: String,
    /// ERP customer (relatie) id
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    /// Equal to subtotal: VAT is embedded in unit prices
    pub total: f64,
    pub status: OrderStatus,
    /// ERP sales order id, set only once SYNCED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snelstart_order_id: Option<String>,
    /// Last sync failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Failed background sync attempts (mirror of the queue attempt count)
    #[serde(default)]
    pub retry_count: u32,
    /// Stamp of the sync job that owns this order; a manual retry issues a
    /// new one so attempts from an older job cannot touch the order
    #[serde(default)]
    pub sync_generation: String,
    /// First successful sync (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Operator that placed the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LocalOrder {
    /// Record a successful ERP sync
    ///
    /// `synced_at` keeps the first success timestamp.
    pub fn mark_synced(&mut self, remote_id: impl Into<String>, now: i64) {
        self.status = OrderStatus::Synced;
        self.snelstart_order_id = Some(remote_id.into());
        self.error_message = None;
        self.synced_at.get_or_insert(now);
        self.updated_at = now;
    }

    /// Record a failed sync attempt without leaving PENDING_SYNC
    pub fn record_sync_failure(&mut self, message: impl Into<String>, now: i64) {
        self.error_message = Some(message.into());
        self.updated_at = now;
    }

    /// Move to the terminal FAILED state
    pub fn mark_failed(&mut self, message: impl Into<String>, now: i64) {
        self.status = OrderStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = now;
    }

    /// Manual retry: back to PENDING_SYNC with a fresh attempt budget
    pub fn reset_for_retry(&mut self, generation: impl Into<String>, now: i64) {
        self.status = OrderStatus::PendingSync;
        self.retry_count = 0;
        self.sync_generation = generation.into();
        self.error_message = None;
        self.updated_at = now;
    }

    /// Whether the order exists in the ERP
    pub fn is_synced(&self) -> bool {
        self.status == OrderStatus::Synced
    }
}

// ============================================================================
// API Payloads
// ============================================================================

/// Create order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: String,
    pub customer_id: String,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Update order request (only present fields change)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<OrderItemInput>>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Order list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}
