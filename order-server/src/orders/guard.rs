//! Invoiced guard
//!
//! Once the ERP has turned a sales order into an invoice, the local order
//! must not change. Only synced orders are checked; a failed lookup lets the
//! mutation through with a warning.

use super::error::{OrderError, OrderResult};
use crate::gateway::OrderGateway;
use shared::order::LocalOrder;

pub async fn ensure_not_invoiced(gateway: &dyn OrderGateway, order: &LocalOrder) -> OrderResult<()> {
    let Some(remote_id) = order.snelstart_order_id.as_deref() else {
        return Ok(());
    };

    match gateway.get_orders_for_customer(&order.customer_id).await {
        Ok(remote_orders) => {
            let invoiced = remote_orders
                .iter()
                .any(|r| r.id == remote_id && r.proces_status.is_invoiced());
            if invoiced {
                tracing::info!(order_id = %order.id, remote_id = %remote_id, "Order is invoiced in ERP, mutation refused");
                return Err(OrderError::Invoiced(order.id.clone()));
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(
                order_id = %order.id,
                error = %e,
                "Invoiced check failed, allowing mutation"
            );
            Ok(())
        }
    }
}
