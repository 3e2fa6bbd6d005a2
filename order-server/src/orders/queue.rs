//! Durable sync job queue
//!
//! At-least-once queue of "sync this order" jobs, keyed by order id so at
//! most one job per order exists. Failed attempts are rescheduled with
//! exponential backoff plus jitter; a job that exhausts its attempts moves to
//! the dead-letter table.
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `sync_queue` | `order_id` | `SyncJob` (JSON) |
//! | `sync_dead_letter` | `order_id` | `DeadLetterEntry` (JSON) |
//!
//! The queue is injected into the orchestrator and worker as
//! `Arc<dyn SyncQueue>`.

use crate::db::{StorageResult, ensure_tables};
use rand::Rng;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Notify;

const SYNC_QUEUE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sync_queue");
const DEAD_LETTER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sync_dead_letter");

/// Backoff strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// delay_ms × 2^(attempt − 1)
    Exponential { delay_ms: u64 },
}

/// Enqueue options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Attempt budget
    pub attempts: u32,
    pub backoff: Backoff,
    /// Backoff cap
    pub max_delay_ms: u64,
    /// Delay is multiplied by a random value in [1-jitter, 1+jitter]
    pub jitter: f64,
    /// Delay before the first attempt
    pub initial_delay_ms: u64,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Backoff::Exponential { delay_ms: 2_000 },
            max_delay_ms: 300_000,
            jitter: 0.2,
            initial_delay_ms: 0,
        }
    }
}

impl JobOptions {
    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }
}

/// Queue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncJob {
    pub order_id: String,
    /// Matches `LocalOrder.sync_generation`; bookkeeping for an attempt is
    /// dropped once the job has been replaced under a new generation
    #[serde(default)]
    pub generation: String,
    /// Failed attempts so far
    pub attempts: u32,
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub max_delay_ms: u64,
    pub jitter: f64,
    /// Due time (Unix millis)
    pub next_run_at: i64,
    pub enqueued_at: i64,
    pub last_error: Option<String>,
}

impl SyncJob {
    /// Number of the attempt that runs next (1-based)
    pub fn next_attempt(&self) -> u32 {
        self.attempts + 1
    }
}

/// Dead letter entry (job gave up)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub order_id: String,
    pub enqueued_at: i64,
    pub failed_at: i64,
    pub attempts: u32,
    pub last_error: String,
}

/// What happened to a job after a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Rescheduled { attempts: u32, next_run_at: i64 },
    DeadLettered { attempts: u32 },
    /// No job of this generation (completed, removed or replaced concurrently)
    Missing,
}

/// Delay after failed attempt number `attempt` (1-based), before jitter
pub fn backoff_delay_ms(backoff: Backoff, attempt: u32, max_delay_ms: u64) -> u64 {
    match backoff {
        Backoff::Exponential { delay_ms } => {
            let shift = attempt.saturating_sub(1).min(20);
            delay_ms.saturating_mul(1u64 << shift).min(max_delay_ms)
        }
    }
}

fn jittered(delay_ms: u64, jitter: f64) -> u64 {
    if jitter <= 0.0 || delay_ms == 0 {
        return delay_ms;
    }
    let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
    (delay_ms as f64 * factor) as u64
}

/// Durable job queue
///
/// `complete`, `record_failure` and `dead_letter` act only on the job of the
/// given generation and are no-ops once it has been replaced.
pub trait SyncQueue: Send + Sync {
    /// Add a job, replacing any job (or dead letter) for the same order
    fn enqueue(&self, order_id: &str, generation: &str, options: JobOptions, now: i64) -> StorageResult<SyncJob>;

    /// Jobs with `next_run_at <= now`, earliest first
    fn due_jobs(&self, now: i64, limit: usize) -> StorageResult<Vec<SyncJob>>;

    fn get(&self, order_id: &str) -> StorageResult<Option<SyncJob>>;

    /// All queued jobs
    fn jobs(&self) -> StorageResult<Vec<SyncJob>>;

    /// Attempt succeeded (or no longer needed): drop the job
    fn complete(&self, order_id: &str, generation: &str) -> StorageResult<bool>;

    /// Attempt failed: reschedule with backoff, or dead-letter once the
    /// attempt budget is spent
    fn record_failure(&self, order_id: &str, generation: &str, error: &str, now: i64) -> StorageResult<JobOutcome>;

    /// Move a job to the dead-letter table now, recording `attempts`
    fn dead_letter(
        &self,
        order_id: &str,
        generation: &str,
        attempts: u32,
        error: &str,
        now: i64,
    ) -> StorageResult<bool>;

    /// Drop whatever job the order has; returns whether one existed
    fn remove(&self, order_id: &str) -> StorageResult<bool>;

    fn dead_letters(&self) -> StorageResult<Vec<DeadLetterEntry>>;

    /// Signalled on every enqueue
    fn notifier(&self) -> Arc<Notify>;
}

/// Job queue backed by redb
#[derive(Clone)]
pub struct RedbSyncQueue {
    db: Arc<Database>,
    notify: Arc<Notify>,
}

impl std::fmt::Debug for RedbSyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSyncQueue").finish_non_exhaustive()
    }
}

type JsonTable<'txn> = redb::Table<'txn, &'static str, &'static [u8]>;

/// Current job for `order_id` if it carries `generation`
fn job_of_generation(
    queue: &JsonTable<'_>,
    order_id: &str,
    generation: &str,
) -> StorageResult<Option<SyncJob>> {
    let job = queue
        .get(order_id)?
        .map(|guard| serde_json::from_slice::<SyncJob>(guard.value()))
        .transpose()?;
    Ok(job.filter(|job| job.generation == generation))
}

impl RedbSyncQueue {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        ensure_tables(&db, &[SYNC_QUEUE_TABLE, DEAD_LETTER_TABLE])?;
        Ok(Self {
            db,
            notify: Arc::new(Notify::new()),
        })
    }

    fn move_to_dead_letter(
        queue: &mut JsonTable<'_>,
        dead: &mut JsonTable<'_>,
        job: &SyncJob,
        error: &str,
        now: i64,
        attempts: u32,
    ) -> StorageResult<()> {
        queue.remove(job.order_id.as_str())?;
        let entry = DeadLetterEntry {
            order_id: job.order_id.clone(),
            enqueued_at: job.enqueued_at,
            failed_at: now,
            attempts,
            last_error: error.to_string(),
        };
        let value = serde_json::to_vec(&entry)?;
        dead.insert(job.order_id.as_str(), value.as_slice())?;
        Ok(())
    }
}

impl SyncQueue for RedbSyncQueue {
    fn enqueue(&self, order_id: &str, generation: &str, options: JobOptions, now: i64) -> StorageResult<SyncJob> {
        let job = SyncJob {
            order_id: order_id.to_string(),
            generation: generation.to_string(),
            attempts: 0,
            max_attempts: options.attempts.max(1),
            backoff: options.backoff,
            max_delay_ms: options.max_delay_ms,
            jitter: options.jitter,
            next_run_at: now + options.initial_delay_ms as i64,
            enqueued_at: now,
            last_error: None,
        };

        let txn = self.db.begin_write()?;
        {
            let mut queue = txn.open_table(SYNC_QUEUE_TABLE)?;
            let mut dead = txn.open_table(DEAD_LETTER_TABLE)?;
            let value = serde_json::to_vec(&job)?;
            queue.insert(order_id, value.as_slice())?;
            dead.remove(order_id)?;
        }
        txn.commit()?;

        self.notify.notify_one();
        Ok(job)
    }

    fn due_jobs(&self, now: i64, limit: usize) -> StorageResult<Vec<SyncJob>> {
        let mut due: Vec<SyncJob> = self
            .jobs()?
            .into_iter()
            .filter(|job| job.next_run_at <= now)
            .collect();
        due.sort_by_key(|job| job.next_run_at);
        due.truncate(limit);
        Ok(due)
    }

    fn get(&self, order_id: &str) -> StorageResult<Option<SyncJob>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SYNC_QUEUE_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn jobs(&self) -> StorageResult<Vec<SyncJob>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SYNC_QUEUE_TABLE)?;

        let mut jobs = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            jobs.push(serde_json::from_slice::<SyncJob>(value.value())?);
        }
        Ok(jobs)
    }

    fn complete(&self, order_id: &str, generation: &str) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut queue = txn.open_table(SYNC_QUEUE_TABLE)?;
            match job_of_generation(&queue, order_id, generation)? {
                Some(_) => {
                    queue.remove(order_id)?;
                    true
                }
                None => false,
            }
        };
        txn.commit()?;
        Ok(removed)
    }

    fn record_failure(&self, order_id: &str, generation: &str, error: &str, now: i64) -> StorageResult<JobOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut queue = txn.open_table(SYNC_QUEUE_TABLE)?;
            let mut dead = txn.open_table(DEAD_LETTER_TABLE)?;

            match job_of_generation(&queue, order_id, generation)? {
                None => JobOutcome::Missing,
                Some(job) if job.next_attempt() >= job.max_attempts => {
                    let attempts = job.next_attempt();
                    Self::move_to_dead_letter(&mut queue, &mut dead, &job, error, now, attempts)?;
                    JobOutcome::DeadLettered { attempts }
                }
                Some(mut job) => {
                    let attempt = job.next_attempt();
                    let delay = jittered(
                        backoff_delay_ms(job.backoff, attempt, job.max_delay_ms),
                        job.jitter,
                    );
                    job.attempts = attempt;
                    job.next_run_at = now + delay as i64;
                    job.last_error = Some(error.to_string());
                    let value = serde_json::to_vec(&job)?;
                    queue.insert(order_id, value.as_slice())?;
                    JobOutcome::Rescheduled {
                        attempts: job.attempts,
                        next_run_at: job.next_run_at,
                    }
                }
            }
        };
        txn.commit()?;
        Ok(outcome)
    }

    fn dead_letter(
        &self,
        order_id: &str,
        generation: &str,
        attempts: u32,
        error: &str,
        now: i64,
    ) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let moved = {
            let mut queue = txn.open_table(SYNC_QUEUE_TABLE)?;
            let mut dead = txn.open_table(DEAD_LETTER_TABLE)?;
            match job_of_generation(&queue, order_id, generation)? {
                Some(job) => {
                    Self::move_to_dead_letter(&mut queue, &mut dead, &job, error, now, attempts)?;
                    true
                }
                None => false,
            }
        };
        txn.commit()?;
        Ok(moved)
    }

    fn remove(&self, order_id: &str) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut queue = txn.open_table(SYNC_QUEUE_TABLE)?;
            queue.remove(order_id)?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }

    fn dead_letters(&self) -> StorageResult<Vec<DeadLetterEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEAD_LETTER_TABLE)?;

        let mut entries = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice::<DeadLetterEntry>(value.value())?);
        }
        entries.sort_by_key(|e| std::cmp::Reverse(e.failed_at));
        Ok(entries)
    }

    fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> RedbSyncQueue {
        RedbSyncQueue::new(crate::db::open_in_memory().unwrap()).unwrap()
    }

    fn no_jitter() -> JobOptions {
        JobOptions {
            jitter: 0.0,
            ..JobOptions::default()
        }
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let b = Backoff::Exponential { delay_ms: 2_000 };
        assert_eq!(backoff_delay_ms(b, 1, 300_000), 2_000);
        assert_eq!(backoff_delay_ms(b, 2, 300_000), 4_000);
        assert_eq!(backoff_delay_ms(b, 3, 300_000), 8_000);
        assert_eq!(backoff_delay_ms(b, 4, 300_000), 16_000);
        assert_eq!(backoff_delay_ms(b, 10, 300_000), 300_000);
    }

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..100 {
            let d = jittered(10_000, 0.2);
            assert!((7_999..=12_000).contains(&d), "delay {} out of range", d);
        }
        assert_eq!(jittered(10_000, 0.0), 10_000);
    }

    #[test]
    fn test_enqueue_is_unique_per_order() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        q.record_failure("o-1", "g1", "boom", 0).unwrap();
        q.enqueue("o-1", "g2", no_jitter(), 100).unwrap();

        let jobs = q.jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].attempts, 0);
        assert_eq!(jobs[0].next_run_at, 100);
    }

    #[test]
    fn test_due_jobs_respects_schedule() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter().with_initial_delay(2_000), 0).unwrap();
        q.enqueue("o-2", "g1", no_jitter(), 0).unwrap();

        let due = q.due_jobs(1_000, 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].order_id, "o-2");
        assert_eq!(q.due_jobs(2_000, 10).unwrap().len(), 2);
        assert_eq!(q.due_jobs(2_000, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_failures_reschedule_then_dead_letter() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();

        let expected = [2_000, 4_000, 8_000, 16_000];
        for (i, delay) in expected.iter().enumerate() {
            let outcome = q.record_failure("o-1", "g1", "503", 0).unwrap();
            assert_eq!(
                outcome,
                JobOutcome::Rescheduled {
                    attempts: i as u32 + 1,
                    next_run_at: *delay
                }
            );
        }

        let outcome = q.record_failure("o-1", "g1", "503 again", 0).unwrap();
        assert_eq!(outcome, JobOutcome::DeadLettered { attempts: 5 });
        assert!(q.get("o-1").unwrap().is_none());

        let dead = q.dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].attempts, 5);
        assert_eq!(dead[0].last_error, "503 again");

        // Fresh enqueue clears the dead letter
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        assert!(q.dead_letters().unwrap().is_empty());
    }

    #[test]
    fn test_dead_letter_before_ceiling() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        q.record_failure("o-1", "g1", "503", 0).unwrap();
        q.dead_letter("o-1", "g1", 2, "400 Bad Request", 10).unwrap();

        assert!(q.jobs().unwrap().is_empty());
        let dead = q.dead_letters().unwrap();
        assert_eq!(dead[0].attempts, 2);
        assert_eq!(dead[0].failed_at, 10);
    }

    #[test]
    fn test_complete_and_missing() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        assert!(q.complete("o-1", "g1").unwrap());
        assert!(q.get("o-1").unwrap().is_none());
        assert_eq!(q.record_failure("o-1", "g1", "x", 0).unwrap(), JobOutcome::Missing);
        assert!(!q.remove("o-1").unwrap());
    }

    #[test]
    fn test_replaced_job_ignores_old_generation() {
        let q = queue();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        q.record_failure("o-1", "g1", "503", 0).unwrap();
        q.enqueue("o-1", "g2", no_jitter(), 50).unwrap();

        assert_eq!(q.record_failure("o-1", "g1", "late", 60).unwrap(), JobOutcome::Missing);
        assert!(!q.dead_letter("o-1", "g1", 5, "late", 60).unwrap());
        assert!(!q.complete("o-1", "g1").unwrap());

        let job = q.get("o-1").unwrap().unwrap();
        assert_eq!(job.generation, "g2");
        assert_eq!(job.attempts, 0);
        assert!(job.last_error.is_none());
        assert!(q.dead_letters().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_notifies() {
        let q = queue();
        let notify = q.notifier();
        q.enqueue("o-1", "g1", no_jitter(), 0).unwrap();
        // Permit stored by notify_one
        tokio::time::timeout(std::time::Duration::from_millis(100), notify.notified())
            .await
            .unwrap();
    }
}
