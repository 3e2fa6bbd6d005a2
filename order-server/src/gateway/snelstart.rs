//! SnelStart-backed gateway

use super::{
    GatewayError, GatewayResult, OrderGateway, RemoteOrderSummary, SalesOrderCreated,
    SalesOrderRequest,
};
use async_trait::async_trait;
use snelstart_client::types::BtwIngaveModel;
use snelstart_client::{
    ClientError, IdRef, ProcesStatus, SnelStartClient, VerkooporderCreate, VerkooporderRegel,
};
use std::future::Future;
use std::time::Duration;

/// Gateway over [`SnelStartClient`], bounding every call with a timeout
#[derive(Debug, Clone)]
pub struct SnelStartGateway {
    client: SnelStartClient,
    timeout: Duration,
}

impl SnelStartGateway {
    pub fn new(client: SnelStartClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T, ClientError>>) -> GatewayResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

fn classify(err: ClientError) -> GatewayError {
    if err.is_retryable() {
        return GatewayError::Transient(err.to_string());
    }
    match err {
        ClientError::Status { status, body } => GatewayError::Permanent {
            status: Some(status),
            message: body,
        },
        other => GatewayError::Permanent {
            status: None,
            message: other.to_string(),
        },
    }
}

fn to_verkooporder(request: &SalesOrderRequest) -> VerkooporderCreate {
    VerkooporderCreate {
        relatie: IdRef::new(&request.customer_ref),
        datum: request.order_date,
        proces_status: ProcesStatus::Order,
        regels: request
            .lines
            .iter()
            .map(|line| VerkooporderRegel {
                artikel: IdRef::new(&line.product_ref),
                omschrijving: line.description.clone(),
                stuksprijs: line.unit_price,
                aantal: line.quantity,
            })
            .collect(),
        memo: request.memo.clone(),
        verkooporder_btw_ingave_model: BtwIngaveModel::Inclusief,
    }
}

#[async_trait]
impl OrderGateway for SnelStartGateway {
    async fn create_sales_order(&self, request: &SalesOrderRequest) -> GatewayResult<SalesOrderCreated> {
        let body = to_verkooporder(request);
        let created = self.bounded(self.client.create_verkooporder(&body)).await?;
        Ok(SalesOrderCreated { id: created.id })
    }

    async fn get_orders_for_customer(&self, customer_id: &str) -> GatewayResult<Vec<RemoteOrderSummary>> {
        let orders = self
            .bounded(self.client.verkooporders_for_relatie(customer_id))
            .await?;
        Ok(orders
            .into_iter()
            .map(|o| RemoteOrderSummary {
                id: o.id,
                proces_status: o.proces_status,
            })
            .collect())
    }
}
