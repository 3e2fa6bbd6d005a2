//! Audit service
//!
//! `log()` never blocks the caller and never fails it: requests go onto a
//! bounded mpsc channel drained by [`super::AuditWorker`]. A full or closed
//! channel drops the entry with an error log.

use super::storage::AuditStorage;
use super::types::{AuditAction, AuditEntry, AuditQuery};
use crate::db::StorageResult;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Request sent to the audit worker
#[derive(Debug)]
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<String>,
    pub details: serde_json::Value,
}

pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    pub fn new(
        storage: AuditStorage,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Arc::new(Self { storage, tx }), rx)
    }

    /// Record an audit entry (non-blocking)
    pub fn log(
        &self,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        operator_id: Option<String>,
        details: serde_json::Value,
    ) {
        let req = AuditLogRequest {
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            operator_id,
            details,
        };

        match self.tx.try_send(req) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(req)) => {
                tracing::error!(
                    action = %req.action,
                    resource_id = %req.resource_id,
                    "Audit channel full, entry dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(req)) => {
                tracing::error!(
                    action = %req.action,
                    resource_id = %req.resource_id,
                    "Audit channel closed, entry dropped"
                );
            }
        }
    }

    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }

    pub fn query(&self, q: &AuditQuery) -> StorageResult<(Vec<AuditEntry>, u64)> {
        self.storage.query(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditWorker;

    #[tokio::test]
    async fn test_log_reaches_storage_through_worker() {
        let storage = AuditStorage::new(crate::db::open_in_memory().unwrap()).unwrap();
        let (service, rx) = AuditService::new(storage.clone(), 8);

        service.log(
            AuditAction::PriceRuleCreated,
            "price_rule",
            "r-1",
            Some("u-1".into()),
            serde_json::json!({"priority": 10}),
        );
        drop(service);

        // Worker exits once every sender is gone
        AuditWorker::new(storage.clone())
            .run(rx, tokio_util::sync::CancellationToken::new())
            .await;

        let (items, total) = storage.query(&AuditQuery { limit: 50, ..Default::default() }).unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].resource_id, "r-1");
        assert_eq!(items[0].details["priority"], 10);
    }

    #[tokio::test]
    async fn test_shutdown_drains_buffered_entries() {
        let storage = AuditStorage::new(crate::db::open_in_memory().unwrap()).unwrap();
        let (service, rx) = AuditService::new(storage.clone(), 8);
        service.log(AuditAction::OrderDeleted, "order", "o-1", None, serde_json::Value::Null);
        service.log(AuditAction::OrderDeleted, "order", "o-2", None, serde_json::Value::Null);

        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        AuditWorker::new(storage.clone()).run(rx, token).await;

        let (_, total) = storage.query(&AuditQuery { limit: 50, ..Default::default() }).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let storage = AuditStorage::new(crate::db::open_in_memory().unwrap()).unwrap();
        let (service, _rx) = AuditService::new(storage, 1);
        for _ in 0..3 {
            service.log(AuditAction::OrderCreated, "order", "o-1", None, serde_json::Value::Null);
        }
    }
}
