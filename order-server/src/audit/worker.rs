//! Audit background worker
//!
//! Drains the audit channel into redb. Exits when the channel closes, or on
//! shutdown after draining what is already buffered.

use super::service::AuditLogRequest;
use super::storage::AuditStorage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct AuditWorker {
    storage: AuditStorage,
}

impl AuditWorker {
    pub fn new(storage: AuditStorage) -> Self {
        Self { storage }
    }

    /// Run until every sender is dropped or `shutdown` is cancelled
    pub async fn run(self, mut rx: mpsc::Receiver<AuditLogRequest>, shutdown: CancellationToken) {
        tracing::info!("Audit log worker started");

        loop {
            tokio::select! {
                req = rx.recv() => match req {
                    Some(req) => self.write(req),
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    rx.close();
                    while let Ok(req) = rx.try_recv() {
                        self.write(req);
                    }
                    break;
                }
            }
        }

        tracing::info!("Audit log worker stopping");
    }

    fn write(&self, req: AuditLogRequest) {
        match self.storage.append(
            req.action,
            req.resource_type,
            req.resource_id,
            req.operator_id,
            req.details,
        ) {
            Ok(entry) => {
                tracing::debug!(
                    audit_id = entry.id,
                    action = %entry.action,
                    resource = %entry.resource_type,
                    "Audit entry recorded"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write audit entry");
            }
        }
    }
}
