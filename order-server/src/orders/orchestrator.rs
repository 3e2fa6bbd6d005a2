//! Order Orchestrator
//!
//! Owns the order lifecycle:
//!
//! ```text
//! create ─► PENDING_SYNC ──(gateway ok)──► SYNCED
//!                │
//!                └─(gateway error)─► enqueue job ─► SyncWorker ─► sync_order()
//!                                                      │
//!                                  attempts exhausted ─┴─► FAILED ──(retry_order)──► PENDING_SYNC
//! ```
//!
//! # Retry counter
//!
//! The queue job's attempt count is authoritative. The worker passes the
//! attempt number into [`OrderOrchestrator::sync_order`], which mirrors it
//! into `LocalOrder.retry_count` and marks the order FAILED on the last
//! attempt. The synchronous attempt made during create counts toward
//! neither.
//!
//! # Generations
//!
//! Every job carries the order's `sync_generation`. A manual retry stamps
//! the order with a new generation before it replaces the job, so a failed
//! attempt still running under the old job can no longer touch the order
//! or the new job.

use super::error::{OrderError, OrderResult};
use super::guard::ensure_not_invoiced;
use super::money::order_total;
use super::queue::{Backoff, JobOptions, SyncJob, SyncQueue};
use super::storage::{InsertOutcome, OrderStorage, UpdateResult};
use super::validation::{normalize_items, require_non_empty, validate_memo};
use crate::audit::{AuditAction, AuditService};
use crate::gateway::{GatewayError, OrderGateway, SalesOrderRequest};
use shared::order::{
    CreateOrderRequest, LocalOrder, OrderQuery, OrderStatus, UpdateOrderRequest,
};
use std::sync::Arc;

const RESOURCE_ORDER: &str = "order";

/// Background sync settings
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    /// Mark the order FAILED on the first permanent (4xx) rejection
    pub fail_fast_on_permanent: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 2_000,
            max_delay_ms: 300_000,
            jitter: 0.2,
            fail_fast_on_permanent: false,
        }
    }
}

impl SyncSettings {
    pub fn job_options(&self) -> JobOptions {
        JobOptions {
            attempts: self.max_attempts,
            backoff: Backoff::Exponential {
                delay_ms: self.base_delay_ms,
            },
            max_delay_ms: self.max_delay_ms,
            jitter: self.jitter,
            initial_delay_ms: 0,
        }
    }
}

/// Result of create_order
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// New order (synced or queued for background sync)
    Created(LocalOrder),
    /// Idempotency key already used; the stored order, unchanged
    Replayed(LocalOrder),
}

impl CreateOutcome {
    pub fn order(&self) -> &LocalOrder {
        match self {
            Self::Created(o) | Self::Replayed(o) => o,
        }
    }

    pub fn into_order(self) -> LocalOrder {
        match self {
            Self::Created(o) | Self::Replayed(o) => o,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// Result of a background sync attempt that did not fail
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Synced(LocalOrder),
    /// Order is not PENDING_SYNC (already synced, failed, or changed meanwhile)
    Skipped(OrderStatus),
    /// The job was replaced by a manual retry while the attempt ran
    Superseded,
    /// Order no longer exists
    Missing,
}

pub struct OrderOrchestrator {
    storage: OrderStorage,
    gateway: Arc<dyn OrderGateway>,
    queue: Arc<dyn SyncQueue>,
    audit: Arc<AuditService>,
    settings: SyncSettings,
}

impl std::fmt::Debug for OrderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderOrchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OrderOrchestrator {
    pub fn new(
        storage: OrderStorage,
        gateway: Arc<dyn OrderGateway>,
        queue: Arc<dyn SyncQueue>,
        audit: Arc<AuditService>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            storage,
            gateway,
            queue,
            audit,
            settings,
        }
    }

    pub fn queue(&self) -> &Arc<dyn SyncQueue> {
        &self.queue
    }

    // ========== Create ==========

    /// Create an order and attempt the first sync inline
    ///
    /// The order is persisted as PENDING_SYNC before the gateway is called.
    /// Gateway failures never fail the request: the order is returned with
    /// its error recorded and a background job queued.
    pub async fn create_order(
        &self,
        req: CreateOrderRequest,
        operator_id: Option<String>,
    ) -> OrderResult<CreateOutcome> {
        require_non_empty(&req.customer_id, "customer_id")?;
        require_non_empty(&req.idempotency_key, "idempotency_key")?;
        validate_memo(req.memo.as_deref())?;
        let items = normalize_items(&req.items)?;

        if let Some(existing) = self.storage.find_by_idempotency_key(&req.idempotency_key)? {
            tracing::debug!(order_id = %existing.id, key = %req.idempotency_key, "Idempotent replay");
            return Ok(CreateOutcome::Replayed(existing));
        }

        let now = shared::util::now_millis();
        let total = order_total(&items);
        let order = LocalOrder {
            id: shared::util::new_id(),
            idempotency_key: req.idempotency_key,
            customer_id: req.customer_id,
            items,
            subtotal: total,
            total,
            status: OrderStatus::PendingSync,
            snelstart_order_id: None,
            error_message: None,
            retry_count: 0,
            sync_generation: shared::util::new_id(),
            synced_at: None,
            memo: req.memo,
            created_by: operator_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let order = match self.storage.insert_if_absent(&order)? {
            InsertOutcome::Inserted(order) => order,
            InsertOutcome::Existing(existing) => {
                tracing::debug!(order_id = %existing.id, "Lost idempotency race, replaying winner");
                return Ok(CreateOutcome::Replayed(existing));
            }
        };

        tracing::info!(order_id = %order.id, customer_id = %order.customer_id, total = order.total, "Order created");
        self.audit.log(
            AuditAction::OrderCreated,
            RESOURCE_ORDER,
            &order.id,
            operator_id.clone(),
            serde_json::json!({
                "idempotency_key": order.idempotency_key,
                "customer_id": order.customer_id,
                "total": order.total,
                "items": order.items.len(),
            }),
        );

        let request = SalesOrderRequest::from_order(&order, now);
        let order = match self.gateway.create_sales_order(&request).await {
            Ok(created) => self.on_initial_success(order, &created.id, operator_id)?,
            Err(e) => self.on_initial_failure(order, e, operator_id)?,
        };

        Ok(CreateOutcome::Created(order))
    }

    fn on_initial_success(
        &self,
        order: LocalOrder,
        remote_id: &str,
        operator_id: Option<String>,
    ) -> OrderResult<LocalOrder> {
        let now = shared::util::now_millis();
        let result = self.storage.update_with(&order.id, |o| {
            if o.status != OrderStatus::PendingSync {
                return false;
            }
            o.mark_synced(remote_id, now);
            true
        })?;

        match result {
            UpdateResult::Updated(synced) => {
                tracing::info!(order_id = %synced.id, remote_id = %remote_id, "Order synced to ERP");
                self.audit.log(
                    AuditAction::OrderSynced,
                    RESOURCE_ORDER,
                    &synced.id,
                    operator_id,
                    serde_json::json!({ "snelstart_order_id": remote_id, "attempt": 0 }),
                );
                Ok(synced)
            }
            UpdateResult::Unchanged(current) => Ok(current),
            UpdateResult::NotFound => {
                tracing::warn!(order_id = %order.id, remote_id = %remote_id, "Order deleted while syncing");
                Ok(order)
            }
        }
    }

    fn on_initial_failure(
        &self,
        order: LocalOrder,
        error: GatewayError,
        operator_id: Option<String>,
    ) -> OrderResult<LocalOrder> {
        let now = shared::util::now_millis();
        let message = error.to_string();
        let fail_fast = self.settings.fail_fast_on_permanent && error.is_permanent();

        let result = self.storage.update_with(&order.id, |o| {
            if o.status != OrderStatus::PendingSync || o.sync_generation != order.sync_generation {
                return false;
            }
            if fail_fast {
                o.mark_failed(message.as_str(), now);
            } else {
                o.record_sync_failure(message.as_str(), now);
            }
            true
        })?;

        let order = match result {
            UpdateResult::Updated(o) => o,
            // Retried or changed while the inline attempt ran
            UpdateResult::Unchanged(current) => return Ok(current),
            UpdateResult::NotFound => return Ok(order),
        };

        if fail_fast {
            tracing::warn!(order_id = %order.id, error = %message, "ERP rejected order, marked FAILED");
            self.audit.log(
                AuditAction::OrderFailed,
                RESOURCE_ORDER,
                &order.id,
                operator_id,
                serde_json::json!({ "error": message, "attempts": 0 }),
            );
            return Ok(order);
        }

        tracing::warn!(order_id = %order.id, error = %message, "Initial sync failed, queued for retry");
        let options = self
            .settings
            .job_options()
            .with_initial_delay(self.settings.base_delay_ms);
        if let Err(e) = self.queue.enqueue(&order.id, &order.sync_generation, options, now) {
            // Startup recovery re-enqueues PENDING_SYNC orders without a job
            tracing::error!(order_id = %order.id, error = %e, "Failed to enqueue sync job");
        }
        self.audit.log(
            AuditAction::OrderSyncFailed,
            RESOURCE_ORDER,
            &order.id,
            operator_id,
            serde_json::json!({ "error": message, "attempt": 0 }),
        );
        Ok(order)
    }

    // ========== Background sync ==========

    /// One background sync attempt (called by the worker)
    ///
    /// Runs the job's next attempt. Returns `Err(SyncFailed)` when the
    /// gateway call fails, after the order update is persisted; `terminal`
    /// tells the caller the order is now FAILED and the job must not be
    /// rescheduled.
    pub async fn sync_order(&self, job: &SyncJob) -> OrderResult<SyncOutcome> {
        let order_id = job.order_id.as_str();
        let attempt = job.next_attempt();
        let max_attempts = job.max_attempts;

        let Some(order) = self.storage.get(order_id)? else {
            return Ok(SyncOutcome::Missing);
        };
        if order.status != OrderStatus::PendingSync {
            tracing::debug!(order_id = %order_id, status = %order.status, "Sync skipped");
            return Ok(SyncOutcome::Skipped(order.status));
        }
        if order.sync_generation != job.generation {
            tracing::debug!(order_id = %order_id, "Sync job superseded");
            return Ok(SyncOutcome::Superseded);
        }

        let now = shared::util::now_millis();
        let request = SalesOrderRequest::from_order(&order, now);

        match self.gateway.create_sales_order(&request).await {
            // The ERP order exists, so a success lands whatever the generation
            Ok(created) => {
                let result = self.storage.update_with(order_id, |o| {
                    if o.status != OrderStatus::PendingSync {
                        return false;
                    }
                    o.mark_synced(created.id.as_str(), now);
                    true
                })?;

                match result {
                    UpdateResult::Updated(synced) => {
                        tracing::info!(
                            order_id = %order_id,
                            remote_id = %created.id,
                            attempt,
                            "Order synced to ERP"
                        );
                        self.audit.log(
                            AuditAction::OrderSynced,
                            RESOURCE_ORDER,
                            order_id,
                            None,
                            serde_json::json!({ "snelstart_order_id": created.id, "attempt": attempt }),
                        );
                        Ok(SyncOutcome::Synced(synced))
                    }
                    UpdateResult::Unchanged(current) => {
                        tracing::warn!(
                            order_id = %order_id,
                            status = %current.status,
                            remote_id = %created.id,
                            "Order changed state during sync"
                        );
                        Ok(SyncOutcome::Skipped(current.status))
                    }
                    UpdateResult::NotFound => {
                        tracing::warn!(order_id = %order_id, remote_id = %created.id, "Order deleted while syncing");
                        Ok(SyncOutcome::Missing)
                    }
                }
            }
            Err(error) => {
                let message = error.to_string();
                let terminal = attempt >= max_attempts
                    || (self.settings.fail_fast_on_permanent && error.is_permanent());

                let result = self.storage.update_with(order_id, |o| {
                    if o.status != OrderStatus::PendingSync || o.sync_generation != job.generation {
                        return false;
                    }
                    o.retry_count = attempt;
                    if terminal {
                        o.mark_failed(message.as_str(), now);
                    } else {
                        o.record_sync_failure(message.as_str(), now);
                    }
                    true
                })?;

                match result {
                    UpdateResult::Updated(_) => {}
                    UpdateResult::Unchanged(current) => {
                        tracing::info!(
                            order_id = %order_id,
                            status = %current.status,
                            attempt,
                            error = %message,
                            "Stale sync attempt failed, order left as is"
                        );
                        return Ok(if current.sync_generation != job.generation {
                            SyncOutcome::Superseded
                        } else {
                            SyncOutcome::Skipped(current.status)
                        });
                    }
                    UpdateResult::NotFound => return Ok(SyncOutcome::Missing),
                }

                if terminal {
                    tracing::error!(order_id = %order_id, attempt, error = %message, "Sync attempts exhausted, order FAILED");
                    self.audit.log(
                        AuditAction::OrderFailed,
                        RESOURCE_ORDER,
                        order_id,
                        None,
                        serde_json::json!({ "error": message, "attempts": attempt }),
                    );
                } else {
                    tracing::warn!(order_id = %order_id, attempt, error = %message, "Sync attempt failed");
                    self.audit.log(
                        AuditAction::OrderSyncFailed,
                        RESOURCE_ORDER,
                        order_id,
                        None,
                        serde_json::json!({ "error": message, "attempt": attempt }),
                    );
                }

                Err(OrderError::SyncFailed {
                    source: error,
                    terminal,
                })
            }
        }
    }

    // ========== Manual retry ==========

    /// Reset a FAILED / PENDING_SYNC order and queue a fresh job
    pub fn retry_order(&self, order_id: &str, operator_id: Option<String>) -> OrderResult<LocalOrder> {
        let now = shared::util::now_millis();
        let generation = shared::util::new_id();
        let result = self.storage.update_with(order_id, |o| {
            if o.is_synced() {
                return false;
            }
            o.reset_for_retry(generation.as_str(), now);
            true
        })?;

        let order = match result {
            UpdateResult::NotFound => return Err(OrderError::NotFound(order_id.to_string())),
            UpdateResult::Unchanged(_) => return Err(OrderError::AlreadySynced(order_id.to_string())),
            UpdateResult::Updated(order) => order,
        };

        self.queue
            .enqueue(order_id, &order.sync_generation, self.settings.job_options(), now)?;

        tracing::info!(order_id = %order_id, "Manual sync retry queued");
        self.audit.log(
            AuditAction::OrderRetryRequested,
            RESOURCE_ORDER,
            order_id,
            operator_id,
            serde_json::json!({}),
        );
        Ok(order)
    }

    // ========== Update / delete ==========

    pub async fn update_order(
        &self,
        order_id: &str,
        req: UpdateOrderRequest,
        operator_id: Option<String>,
    ) -> OrderResult<LocalOrder> {
        let current = self.get_order(order_id)?;
        ensure_not_invoiced(self.gateway.as_ref(), &current).await?;

        validate_memo(req.memo.as_deref())?;
        let items = req.items.as_deref().map(normalize_items).transpose()?;

        let now = shared::util::now_millis();
        let items_changed = items.is_some();
        let memo_changed = req.memo.is_some();
        let result = self.storage.update_with(order_id, |o| {
            if let Some(items) = items {
                let total = order_total(&items);
                o.items = items;
                o.subtotal = total;
                o.total = total;
            }
            if let Some(memo) = req.memo {
                o.memo = Some(memo);
            }
            o.updated_at = now;
            true
        })?;

        let order = match result {
            UpdateResult::Updated(o) | UpdateResult::Unchanged(o) => o,
            UpdateResult::NotFound => return Err(OrderError::NotFound(order_id.to_string())),
        };

        tracing::info!(order_id = %order_id, "Order updated");
        self.audit.log(
            AuditAction::OrderUpdated,
            RESOURCE_ORDER,
            order_id,
            operator_id,
            serde_json::json!({
                "items_changed": items_changed,
                "memo_changed": memo_changed,
                "total": order.total,
            }),
        );
        Ok(order)
    }

    pub async fn delete_order(&self, order_id: &str, operator_id: Option<String>) -> OrderResult<LocalOrder> {
        let current = self.get_order(order_id)?;
        ensure_not_invoiced(self.gateway.as_ref(), &current).await?;

        let Some(removed) = self.storage.delete(order_id)? else {
            return Err(OrderError::NotFound(order_id.to_string()));
        };
        if let Err(e) = self.queue.remove(order_id) {
            tracing::error!(order_id = %order_id, error = %e, "Failed to drop sync job of deleted order");
        }

        tracing::info!(order_id = %order_id, "Order deleted");
        self.audit.log(
            AuditAction::OrderDeleted,
            RESOURCE_ORDER,
            order_id,
            operator_id,
            serde_json::json!({
                "idempotency_key": removed.idempotency_key,
                "status": removed.status,
                "snelstart_order_id": removed.snelstart_order_id,
            }),
        );
        Ok(removed)
    }

    // ========== Reads ==========

    pub fn get_order(&self, order_id: &str) -> OrderResult<LocalOrder> {
        self.storage
            .get(order_id)?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    pub fn list_orders(&self, query: &OrderQuery) -> OrderResult<(Vec<LocalOrder>, usize)> {
        Ok(self.storage.list(query)?)
    }

    // ========== Recovery ==========

    /// Queue a job for every PENDING_SYNC order that has none
    ///
    /// Covers a crash between persisting an order and enqueueing its job.
    pub fn recover_orphans(&self) -> OrderResult<usize> {
        let now = shared::util::now_millis();
        let mut recovered = 0;
        for order in self.storage.pending_sync_orders()? {
            if self.queue.get(&order.id)?.is_none() {
                self.queue
                    .enqueue(&order.id, &order.sync_generation, self.settings.job_options(), now)?;
                recovered += 1;
            }
        }
        if recovered > 0 {
            tracing::info!(count = recovered, "Re-enqueued orphaned PENDING_SYNC orders");
        }
        Ok(recovered)
    }
}
