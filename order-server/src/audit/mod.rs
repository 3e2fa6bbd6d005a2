//! Audit log
//!
//! ```text
//! orchestrator / price rule service
//!   └─ AuditService::log() → mpsc → AuditWorker → redb (audit_log)
//! ```
//!
//! Audit failures are logged and never propagate to the operation that
//! triggered them.

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditLogRequest, AuditService};
pub use storage::AuditStorage;
pub use types::{AuditAction, AuditEntry, AuditListResponse, AuditQuery};
pub use worker::AuditWorker;
