//! Shared test harness: a scripted ERP gateway and a server state over an
//! in-memory database.

#![allow(dead_code)]

use async_trait::async_trait;
use order_server::audit::{AuditEntry, AuditLogRequest, AuditQuery};
use order_server::gateway::{
    GatewayError, GatewayResult, OrderGateway, RemoteOrderSummary, SalesOrderCreated,
    SalesOrderRequest,
};
use order_server::orders::SyncWorker;
use order_server::{Config, ServerState};
use parking_lot::Mutex;
use shared::order::{CreateOrderRequest, OrderItemInput};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};

/// Far enough ahead that every queued job is due
pub const FAR_FUTURE: i64 = i64::MAX / 4;

/// Scripted ERP
///
/// `create_sales_order` pops scripted results first, then fails with the
/// sticky error if one is set, otherwise succeeds with `so-<n>`.
#[derive(Default)]
pub struct FakeGateway {
    scripted: Mutex<VecDeque<GatewayResult<SalesOrderCreated>>>,
    sticky_error: Mutex<Option<GatewayError>>,
    remote_orders: Mutex<Option<GatewayResult<Vec<RemoteOrderSummary>>>>,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
    requests: Mutex<Vec<SalesOrderRequest>>,
    held: Mutex<Option<CallHold>>,
}

/// Parks one `create_sales_order` call until released
#[derive(Clone, Default)]
pub struct CallHold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeGateway {
    pub fn push_result(&self, result: GatewayResult<SalesOrderCreated>) {
        self.scripted.lock().push_back(result);
    }

    pub fn fail_always(&self, error: GatewayError) {
        *self.sticky_error.lock() = Some(error);
    }

    /// The next create call signals `entered`, then waits for `release`
    /// before producing its result
    pub fn hold_next_call(&self) -> CallHold {
        let hold = CallHold::default();
        *self.held.lock() = Some(hold.clone());
        hold
    }

    pub fn recover(&self) {
        *self.sticky_error.lock() = None;
    }

    pub fn set_remote_orders(&self, result: GatewayResult<Vec<RemoteOrderSummary>>) {
        *self.remote_orders.lock() = Some(result);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SalesOrderRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl OrderGateway for FakeGateway {
    async fn create_sales_order(&self, request: &SalesOrderRequest) -> GatewayResult<SalesOrderCreated> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());
        let held = self.held.lock().take();
        if let Some(hold) = held {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        if let Some(result) = self.scripted.lock().pop_front() {
            return result;
        }
        if let Some(error) = self.sticky_error.lock().clone() {
            return Err(error);
        }
        Ok(SalesOrderCreated { id: format!("so-{n}") })
    }

    async fn get_orders_for_customer(&self, _customer_id: &str) -> GatewayResult<Vec<RemoteOrderSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.remote_orders.lock().clone().unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn transient() -> GatewayError {
    GatewayError::Transient("HTTP 503".into())
}

pub fn rejected() -> GatewayError {
    GatewayError::Permanent {
        status: Some(400),
        message: "Relatie onbekend".into(),
    }
}

/// Config with fast, jitter-free backoff
pub fn test_config() -> Config {
    let mut config = Config::with_overrides("./target/test-data", 0);
    config.environment = "test".into();
    config.sync_max_attempts = 5;
    config.sync_base_delay_ms = 10;
    config.sync_max_delay_ms = 1_000;
    config.sync_jitter = 0.0;
    config.sync_concurrency = 4;
    config.sync_fail_fast_on_permanent = false;
    config.price_cache_ttl_secs = 60;
    config.audit_buffer_size = 1024;
    config
}

pub struct TestApp {
    pub state: ServerState,
    pub gateway: Arc<FakeGateway>,
    audit_rx: mpsc::Receiver<AuditLogRequest>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let db = order_server::db::open_in_memory().expect("in-memory db");
        let gateway = Arc::new(FakeGateway::default());
        let (state, audit_rx) =
            ServerState::build(config, db, gateway.clone()).expect("build state");
        Self {
            state,
            gateway,
            audit_rx,
        }
    }

    pub fn worker(&self) -> SyncWorker {
        SyncWorker::new(self.state.orders.clone()).with_concurrency(4)
    }

    /// Persist buffered audit requests the way the audit worker would
    pub fn flush_audit(&mut self) -> Vec<AuditEntry> {
        let storage = self.state.audit.storage();
        while let Ok(req) = self.audit_rx.try_recv() {
            storage
                .append(req.action, req.resource_type, req.resource_id, req.operator_id, req.details)
                .expect("append audit");
        }
        let (items, _) = storage
            .query(&AuditQuery {
                limit: 500,
                ..Default::default()
            })
            .expect("query audit");
        items
    }
}

pub fn item(product_id: &str, quantity: f64, unit_price: f64) -> OrderItemInput {
    OrderItemInput {
        product_id: product_id.into(),
        product_name: String::new(),
        sku: None,
        quantity,
        unit_price,
        base_price: None,
        vat_percentage: None,
    }
}

pub fn order_request(key: &str, items: Vec<OrderItemInput>) -> CreateOrderRequest {
    CreateOrderRequest {
        idempotency_key: key.into(),
        customer_id: "cust-1".into(),
        items,
        memo: None,
    }
}
