//! Sync Worker - drains the sync queue
//!
//! Wakes on enqueue (queue notifier), on the scan interval, or when a running
//! attempt finishes, and starts due jobs while permits are free. Each attempt
//! runs as its own task through [`OrderOrchestrator::sync_order`], so one
//! slow ERP call only holds its own slot. An in-flight set keyed by order id
//! keeps two attempts for the same order from overlapping.

use super::error::OrderError;
use super::orchestrator::{OrderOrchestrator, SyncOutcome};
use super::queue::{JobOutcome, SyncJob, SyncQueue};
use dashmap::DashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default number of concurrent sync jobs
pub const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(1);
/// Due jobs read per scan, per permit
const BATCH_FACTOR: usize = 4;

/// Removes the order from the in-flight set on drop (including panics)
struct InFlight {
    set: Arc<DashSet<String>>,
    order_id: String,
}

impl InFlight {
    fn acquire(set: &Arc<DashSet<String>>, order_id: &str) -> Option<Self> {
        set.insert(order_id.to_string()).then(|| Self {
            set: set.clone(),
            order_id: order_id.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.remove(&self.order_id);
    }
}

fn reap(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Sync attempt task aborted");
    }
}

pub struct SyncWorker {
    orchestrator: Arc<OrderOrchestrator>,
    queue: Arc<dyn SyncQueue>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<DashSet<String>>,
    concurrency: usize,
    scan_interval: Duration,
}

impl SyncWorker {
    pub fn new(orchestrator: Arc<OrderOrchestrator>) -> Self {
        let queue = orchestrator.queue().clone();
        Self {
            orchestrator,
            queue,
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            in_flight: Arc::new(DashSet::new()),
            concurrency: DEFAULT_CONCURRENCY,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.concurrency = concurrency;
        self.semaphore = Arc::new(Semaphore::new(concurrency));
        self
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval.max(Duration::from_millis(10));
        self
    }

    /// Run until `shutdown` is cancelled, then wait for running attempts
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            concurrency = self.concurrency,
            scan_interval_ms = self.scan_interval.as_millis() as u64,
            "SyncWorker started"
        );

        if let Err(e) = self.orchestrator.recover_orphans() {
            tracing::error!(error = %e, "Failed to recover orphaned orders");
        }

        let notify = self.queue.notifier();
        let mut ticker = tokio::time::interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("SyncWorker received shutdown signal");
                    break;
                }
                _ = notify.notified() => {}
                _ = ticker.tick() => {}
                Some(result) = running.join_next(), if !running.is_empty() => reap(result),
            }
            while let Some(result) = running.try_join_next() {
                reap(result);
            }
            self.dispatch(shared::util::now_millis(), &mut running);
        }

        while let Some(result) = running.join_next().await {
            reap(result);
        }
    }

    /// Start due jobs while permits are free; returns how many were started
    fn dispatch(&self, now: i64, running: &mut JoinSet<()>) -> usize {
        if self.semaphore.available_permits() == 0 {
            return 0;
        }
        let jobs = match self.queue.due_jobs(now, self.concurrency * BATCH_FACTOR) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read sync queue");
                return 0;
            }
        };

        let mut started = 0;
        for job in jobs {
            if self.in_flight.contains(&job.order_id) {
                continue;
            }
            let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                break;
            };
            let Some(guard) = InFlight::acquire(&self.in_flight, &job.order_id) else {
                continue;
            };

            let orchestrator = self.orchestrator.clone();
            let queue = self.queue.clone();
            running.spawn(async move {
                let _permit = permit;
                let _guard = guard;
                run_job(&orchestrator, queue.as_ref(), job).await;
            });
            started += 1;
        }

        if started > 0 {
            tracing::debug!(count = started, "Started sync attempts");
        }
        started
    }

    /// Start every job due at `now` that fits and wait for those attempts
    pub async fn process_due_at(&self, now: i64) -> usize {
        let mut running = JoinSet::new();
        let started = self.dispatch(now, &mut running);
        while let Some(result) = running.join_next().await {
            reap(result);
        }
        started
    }
}

async fn run_job(orchestrator: &OrderOrchestrator, queue: &dyn SyncQueue, job: SyncJob) {
    let order_id = job.order_id.as_str();
    let generation = job.generation.as_str();
    let attempt = job.next_attempt();
    let result = orchestrator.sync_order(&job).await;
    let now = shared::util::now_millis();

    let bookkeeping = match result {
        Ok(SyncOutcome::Synced(_)) | Ok(SyncOutcome::Skipped(_)) | Ok(SyncOutcome::Superseded) => {
            queue.complete(order_id, generation).map(|_| ())
        }
        Ok(SyncOutcome::Missing) => {
            tracing::warn!(order_id = %order_id, "Sync job for missing order dropped");
            queue.complete(order_id, generation).map(|_| ())
        }
        Err(OrderError::SyncFailed { source, terminal: true }) => queue
            .dead_letter(order_id, generation, attempt, &source.to_string(), now)
            .map(|_| ()),
        Err(e) => {
            if !matches!(e, OrderError::SyncFailed { .. }) {
                tracing::error!(order_id = %order_id, error = %e, "Sync attempt errored");
            }
            queue
                .record_failure(order_id, generation, &e.to_string(), now)
                .map(|outcome| match outcome {
                    JobOutcome::Rescheduled { attempts, next_run_at } => {
                        tracing::debug!(
                            order_id = %order_id,
                            attempts,
                            retry_in_ms = next_run_at - now,
                            "Sync job rescheduled"
                        );
                    }
                    JobOutcome::DeadLettered { attempts } => {
                        tracing::warn!(order_id = %order_id, attempts, "Sync job dead-lettered");
                    }
                    JobOutcome::Missing => {}
                })
        }
    };

    if let Err(e) = bookkeeping {
        tracing::error!(order_id = %order_id, error = %e, "Failed to update sync queue");
    }
}
