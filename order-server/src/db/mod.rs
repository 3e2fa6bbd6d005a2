//! redb database handle and shared storage errors
//!
//! One database file backs every store:
//!
//! | Table | Owner |
//! |-------|-------|
//! | `orders`, `order_idempotency` | [`crate::orders::OrderStorage`] |
//! | `sync_queue`, `sync_dead_letter` | [`crate::orders::RedbSyncQueue`] |
//! | `price_rules` | [`crate::pricing::PriceRuleStorage`] |
//! | `audit_log`, `sequence_counter` | [`crate::audit::AuditStorage`] |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: a write is on disk
//! once `commit()` returns, and the file is always in a consistent state.

use redb::{Database, TableHandle, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Database file name under `WORK_DIR`
pub const DB_FILE_NAME: &str = "orders.redb";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        shared::AppError::database(err.to_string())
    }
}

/// Open or create the database file
pub fn open(path: impl AsRef<Path>) -> StorageResult<Arc<Database>> {
    let db = Database::create(path)?;
    Ok(Arc::new(db))
}

/// Open an in-memory database (tests and ephemeral runs)
pub fn open_in_memory() -> StorageResult<Arc<Database>> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    Ok(Arc::new(db))
}

/// Create tables if they don't exist
pub(crate) fn ensure_tables<K, V>(
    db: &Database,
    tables: &[redb::TableDefinition<'_, K, V>],
) -> StorageResult<()>
where
    K: redb::Key + 'static,
    V: redb::Value + 'static,
{
    let txn: WriteTransaction = db.begin_write()?;
    for table in tables {
        tracing::trace!(table = table.name(), "Ensuring table");
        let _ = txn.open_table(*table)?;
    }
    txn.commit()?;
    Ok(())
}
