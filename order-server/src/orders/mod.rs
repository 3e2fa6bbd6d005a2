//! Order pipeline
//!
//! - [`OrderOrchestrator`]: create / retry / sync / update / delete
//! - [`OrderStorage`]: redb order documents + idempotency index
//! - [`SyncQueue`] / [`RedbSyncQueue`]: durable at-least-once sync jobs
//! - [`SyncWorker`]: background retry loop

pub mod error;
pub mod guard;
pub mod money;
pub mod orchestrator;
pub mod queue;
pub mod storage;
pub mod validation;
pub mod worker;

pub use error::{OrderError, OrderResult};
pub use orchestrator::{CreateOutcome, OrderOrchestrator, SyncOutcome, SyncSettings};
pub use queue::{
    Backoff, DeadLetterEntry, JobOptions, JobOutcome, RedbSyncQueue, SyncJob, SyncQueue,
};
pub use storage::{InsertOutcome, OrderStorage, UpdateResult};
pub use worker::SyncWorker;
