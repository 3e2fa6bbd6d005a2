//! redb audit storage
//!
//! Append-only: there is no update or delete. Sequence numbers come from the
//! `sequence_counter` table and are assigned inside the append transaction,
//! so ids are gap-free and strictly increasing.

use super::types::{AuditAction, AuditEntry, AuditQuery};
use crate::db::{StorageResult, ensure_tables};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

/// key = sequence, value = JSON-serialized AuditEntry
const AUDIT_LOG_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");

/// key = counter name, value = last issued value
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const AUDIT_SEQUENCE_KEY: &str = "audit_log";

/// Audit storage (redb)
#[derive(Clone)]
pub struct AuditStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for AuditStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditStorage").finish_non_exhaustive()
    }
}

impl AuditStorage {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        ensure_tables(&db, &[AUDIT_LOG_TABLE])?;
        ensure_tables(&db, &[SEQUENCE_TABLE])?;
        Ok(Self { db })
    }

    /// Append an entry, assigning the next sequence number
    pub fn append(
        &self,
        action: AuditAction,
        resource_type: String,
        resource_id: String,
        operator_id: Option<String>,
        details: serde_json::Value,
    ) -> StorageResult<AuditEntry> {
        let txn = self.db.begin_write()?;
        let entry = {
            let mut seq_table = txn.open_table(SEQUENCE_TABLE)?;
            let mut log_table = txn.open_table(AUDIT_LOG_TABLE)?;

            let last = seq_table
                .get(AUDIT_SEQUENCE_KEY)?
                .map(|v| v.value())
                .unwrap_or(0);
            let id = last + 1;

            let entry = AuditEntry {
                id,
                timestamp: shared::util::now_millis(),
                action,
                resource_type,
                resource_id,
                operator_id,
                details,
            };

            let value = serde_json::to_vec(&entry)?;
            log_table.insert(id, value.as_slice())?;
            seq_table.insert(AUDIT_SEQUENCE_KEY, id)?;
            entry
        };
        txn.commit()?;
        Ok(entry)
    }

    /// Query newest first; returns (page, total matches)
    pub fn query(&self, q: &AuditQuery) -> StorageResult<(Vec<AuditEntry>, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG_TABLE)?;

        let mut matched = Vec::new();
        for result in table.iter()?.rev() {
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            if q.matches(&entry) {
                matched.push(entry);
            }
        }

        let total = matched.len() as u64;
        let items = matched.into_iter().skip(q.offset).take(q.limit).collect();
        Ok((items, total))
    }
}
