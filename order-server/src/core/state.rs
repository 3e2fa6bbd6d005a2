use redb::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::audit::{AuditLogRequest, AuditService, AuditStorage, AuditWorker};
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result};
use crate::gateway::{OrderGateway, SnelStartGateway};
use crate::orders::{OrderOrchestrator, OrderStorage, RedbSyncQueue, SyncQueue, SyncWorker};
use crate::pricing::{PriceRuleService, PriceRuleStorage};

/// Server state - shared handles to every service
///
/// Cheap to clone (everything is behind `Arc`).
///
/// | Field | Type | Role |
/// |-------|------|------|
/// | config | Config | configuration (immutable) |
/// | db | Arc<Database> | redb database |
/// | orders | Arc<OrderOrchestrator> | order pipeline |
/// | queue | Arc<dyn SyncQueue> | durable sync queue |
/// | pricing | Arc<PriceRuleService> | price rules + resolution |
/// | audit | Arc<AuditService> | audit sink |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Arc<Database>,
    pub orders: Arc<OrderOrchestrator>,
    pub queue: Arc<dyn SyncQueue>,
    pub pricing: Arc<PriceRuleService>,
    pub audit: Arc<AuditService>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("orders", &self.orders)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Wire services over an open database and a gateway
    ///
    /// Returns the audit channel receiver for [`Self::start_background_tasks`].
    pub fn build(
        config: Config,
        db: Arc<Database>,
        gateway: Arc<dyn OrderGateway>,
    ) -> Result<(Self, mpsc::Receiver<AuditLogRequest>)> {
        let (audit, audit_rx) = AuditService::new(AuditStorage::new(db.clone())?, config.audit_buffer_size);

        let queue: Arc<dyn SyncQueue> = Arc::new(RedbSyncQueue::new(db.clone())?);
        let orders = Arc::new(OrderOrchestrator::new(
            OrderStorage::new(db.clone())?,
            gateway,
            queue.clone(),
            audit.clone(),
            config.sync_settings(),
        ));
        let pricing = Arc::new(PriceRuleService::new(
            PriceRuleStorage::new(db.clone())?,
            audit.clone(),
            config.price_cache_ttl(),
        ));

        let state = Self {
            config,
            db,
            orders,
            queue,
            pricing,
            audit,
        };
        Ok((state, audit_rx))
    }

    /// Open the database under `work_dir` and connect to SnelStart
    pub fn initialize(config: &Config) -> Result<(Self, mpsc::Receiver<AuditLogRequest>)> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db = crate::db::open(config.db_path())?;
        tracing::info!(path = %config.db_path().display(), "Database opened");

        let client = snelstart_client::SnelStartClient::new(config.snelstart_config())?;
        if config.snelstart_subscription_key.is_empty() {
            tracing::warn!("SNELSTART_SUBSCRIPTION_KEY is empty, ERP calls will be rejected");
        }
        let gateway: Arc<dyn OrderGateway> =
            Arc::new(SnelStartGateway::new(client, config.gateway_timeout()));

        Self::build(config.clone(), db, gateway)
    }

    /// Start the audit worker and the sync worker
    pub fn start_background_tasks(&self, audit_rx: mpsc::Receiver<AuditLogRequest>) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let audit_worker = AuditWorker::new(self.audit.storage().clone());
        let token = tasks.shutdown_token();
        tasks.spawn("audit_worker", async move {
            audit_worker.run(audit_rx, token).await;
        });

        let sync_worker = SyncWorker::new(self.orders.clone())
            .with_concurrency(self.config.sync_concurrency)
            .with_scan_interval(Duration::from_millis(self.config.sync_scan_interval_ms));
        let token = tasks.shutdown_token();
        tasks.spawn("sync_worker", async move {
            sync_worker.run(token).await;
        });

        tracing::info!("Background tasks registered: {}", tasks.len());
        tasks
    }
}
