//! Remote Order Gateway
//!
//! The ERP seen from the order pipeline: create a sales order, and list a
//! customer's orders for the invoiced guard. [`SnelStartGateway`] is the
//! production implementation; tests substitute scripted fakes.

mod snelstart;

pub use snelstart::SnelStartGateway;
pub use snelstart_client::ProcesStatus;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::error::ErrorCode;
use shared::order::LocalOrder;
use thiserror::Error;

/// Gateway errors, classified for retry decisions
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// 408 / 429 / 5xx / network: worth retrying
    #[error("ERP unavailable: {0}")]
    Transient(String),

    /// Other 4xx or an undecodable success body: retrying will not help
    #[error("ERP rejected request{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Permanent { status: Option<u16>, message: String },

    /// No answer within the configured timeout
    #[error("ERP call timed out after {0} ms")]
    Timeout(u64),
}

impl GatewayError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Transient(_) => ErrorCode::GatewayUnavailable,
            Self::Permanent { .. } => ErrorCode::GatewayRejected,
            Self::Timeout(_) => ErrorCode::GatewayTimeout,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Sales order line sent to the ERP
#[derive(Debug, Clone, PartialEq)]
pub struct SalesOrderLine {
    pub product_ref: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Sales order payload
#[derive(Debug, Clone, PartialEq)]
pub struct SalesOrderRequest {
    pub customer_ref: String,
    /// Order date with time truncated to 00:00:00
    pub order_date: NaiveDateTime,
    pub lines: Vec<SalesOrderLine>,
    pub memo: Option<String>,
}

impl SalesOrderRequest {
    /// Translate a local order, dated on the UTC day of `now`
    pub fn from_order(order: &LocalOrder, now: i64) -> Self {
        Self {
            customer_ref: order.customer_id.clone(),
            order_date: shared::util::day_start(now),
            lines: order
                .items
                .iter()
                .map(|item| SalesOrderLine {
                    product_ref: item.product_id.clone(),
                    description: (!item.product_name.is_empty()).then(|| item.product_name.clone()),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            memo: order.memo.clone(),
        }
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrderCreated {
    pub id: String,
}

/// A customer's order as seen by the invoiced guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrderSummary {
    pub id: String,
    pub proces_status: ProcesStatus,
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create a sales order; any non-2xx is an error
    async fn create_sales_order(&self, request: &SalesOrderRequest) -> GatewayResult<SalesOrderCreated>;

    /// List a customer's sales orders
    async fn get_orders_for_customer(&self, customer_id: &str) -> GatewayResult<Vec<RemoteOrderSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderItem, OrderStatus};

    #[test]
    fn test_request_from_order() {
        let order = LocalOrder {
            id: "o-1".into(),
            idempotency_key: "k1".into(),
            customer_id: "c-1".into(),
            items: vec![OrderItem {
                product_id: "p1".into(),
                product_name: String::new(),
                sku: None,
                quantity: 2.0,
                unit_price: 10.0,
                base_price: 12.0,
                total_price: 20.0,
                vat_percentage: 21.0,
            }],
            subtotal: 20.0,
            total: 20.0,
            status: OrderStatus::PendingSync,
            snelstart_order_id: None,
            error_message: None,
            retry_count: 0,
            sync_generation: String::new(),
            synced_at: None,
            memo: Some("deliver monday".into()),
            created_by: None,
            created_at: 0,
            updated_at: 0,
        };

        // 2026-10-18T15:42:07Z
        let req = SalesOrderRequest::from_order(&order, 1_792_338_127_000);
        assert_eq!(req.customer_ref, "c-1");
        assert_eq!(req.order_date.to_string(), "2026-10-18 00:00:00");
        assert_eq!(req.lines.len(), 1);
        assert_eq!(req.lines[0].unit_price, 10.0);
        assert!(req.lines[0].description.is_none());
        assert_eq!(req.memo.as_deref(), Some("deliver monday"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GatewayError::Transient("503".into()).error_code(),
            ErrorCode::GatewayUnavailable
        );
        let rejected = GatewayError::Permanent { status: Some(400), message: "bad".into() };
        assert!(rejected.is_permanent());
        assert_eq!(rejected.to_string(), "ERP rejected request (400): bad");
        assert_eq!(GatewayError::Timeout(30_000).error_code(), ErrorCode::GatewayTimeout);
    }
}
