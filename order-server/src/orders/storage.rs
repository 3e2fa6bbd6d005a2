//! redb-based order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `LocalOrder` (JSON) | Order documents |
//! | `order_idempotency` | `idempotency_key` | `order_id` | Unique key index |
//!
//! Every mutation is a single write transaction over one order document,
//! so concurrent writers serialise on redb's single-writer lock.

use crate::db::{StorageResult, ensure_tables};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::order::{LocalOrder, OrderQuery, OrderStatus};
use std::sync::Arc;

/// key = order_id, value = JSON-serialized LocalOrder
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// key = idempotency_key, value = order_id
const IDEMPOTENCY_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_idempotency");

/// Default page size for list queries
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// Result of an idempotent insert
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// New order stored
    Inserted(LocalOrder),
    /// Key already taken; the existing order is returned unchanged
    Existing(LocalOrder),
}

/// Result of a conditional update
#[derive(Debug, Clone)]
pub enum UpdateResult {
    NotFound,
    /// Closure declined to change the order
    Unchanged(LocalOrder),
    Updated(LocalOrder),
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Create the store, creating tables if needed
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        ensure_tables(&db, &[ORDERS_TABLE])?;
        ensure_tables(&db, &[IDEMPOTENCY_TABLE])?;
        Ok(Self { db })
    }

    /// Open an in-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::new(crate::db::open_in_memory()?)
    }

    // ========== Writes ==========

    /// Insert unless the idempotency key is already taken
    ///
    /// Check and insert run in one write transaction: of two concurrent
    /// requests with the same key exactly one inserts, the other observes
    /// the winner's order.
    pub fn insert_if_absent(&self, order: &LocalOrder) -> StorageResult<InsertOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut index = txn.open_table(IDEMPOTENCY_TABLE)?;
            let mut orders = txn.open_table(ORDERS_TABLE)?;

            let existing_id = index
                .get(order.idempotency_key.as_str())?
                .map(|guard| guard.value().to_string());

            match existing_id {
                Some(existing_id) => {
                    let existing = orders
                        .get(existing_id.as_str())?
                        .map(|guard| serde_json::from_slice::<LocalOrder>(guard.value()))
                        .transpose()?;
                    match existing {
                        Some(existing) => InsertOutcome::Existing(existing),
                        // Dangling index entry: claim the key
                        None => {
                            tracing::warn!(key = %order.idempotency_key, "Dangling idempotency entry, replacing");
                            index.insert(order.idempotency_key.as_str(), order.id.as_str())?;
                            let value = serde_json::to_vec(order)?;
                            orders.insert(order.id.as_str(), value.as_slice())?;
                            InsertOutcome::Inserted(order.clone())
                        }
                    }
                }
                None => {
                    index.insert(order.idempotency_key.as_str(), order.id.as_str())?;
                    let value = serde_json::to_vec(order)?;
                    orders.insert(order.id.as_str(), value.as_slice())?;
                    InsertOutcome::Inserted(order.clone())
                }
            }
        };

        match outcome {
            InsertOutcome::Inserted(_) => txn.commit()?,
            InsertOutcome::Existing(_) => txn.abort()?,
        }
        Ok(outcome)
    }

    /// Read-modify-write one order atomically
    ///
    /// The closure returns `false` to leave the order untouched (e.g. the
    /// status is no longer the one the caller expected).
    pub fn update_with<F>(&self, order_id: &str, f: F) -> StorageResult<UpdateResult>
    where
        F: FnOnce(&mut LocalOrder) -> bool,
    {
        let txn = self.db.begin_write()?;
        let result = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let current = orders
                .get(order_id)?
                .map(|guard| serde_json::from_slice::<LocalOrder>(guard.value()))
                .transpose()?;

            match current {
                None => UpdateResult::NotFound,
                Some(mut order) => {
                    let original = order.clone();
                    let changed = f(&mut order);
                    if changed
                        && order.status != original.status
                        && !original.status.can_transition_to(order.status)
                    {
                        tracing::error!(
                            order_id = %order_id,
                            from = %original.status,
                            to = %order.status,
                            "Illegal status transition refused"
                        );
                        UpdateResult::Unchanged(original)
                    } else if changed {
                        let value = serde_json::to_vec(&order)?;
                        orders.insert(order_id, value.as_slice())?;
                        UpdateResult::Updated(order)
                    } else {
                        UpdateResult::Unchanged(order)
                    }
                }
            }
        };

        match result {
            UpdateResult::Updated(_) => txn.commit()?,
            _ => txn.abort()?,
        }
        Ok(result)
    }

    /// Delete an order and its idempotency entry
    pub fn delete(&self, order_id: &str) -> StorageResult<Option<LocalOrder>> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let mut index = txn.open_table(IDEMPOTENCY_TABLE)?;

            let removed = orders
                .remove(order_id)?
                .map(|guard| serde_json::from_slice::<LocalOrder>(guard.value()))
                .transpose()?;
            if let Some(order) = &removed {
                index.remove(order.idempotency_key.as_str())?;
            }
            removed
        };
        txn.commit()?;
        Ok(removed)
    }

    // ========== Reads ==========

    pub fn get(&self, order_id: &str) -> StorageResult<Option<LocalOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_idempotency_key(&self, key: &str) -> StorageResult<Option<LocalOrder>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(IDEMPOTENCY_TABLE)?;
        let Some(order_id) = index.get(key)?.map(|g| g.value().to_string()) else {
            return Ok(None);
        };
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        match orders.get(order_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn scan(&self) -> StorageResult<Vec<LocalOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice::<LocalOrder>(value.value())?);
        }
        Ok(orders)
    }

    /// Filtered page, newest first; returns (page, total matches)
    pub fn list(&self, query: &OrderQuery) -> StorageResult<(Vec<LocalOrder>, usize)> {
        let mut orders: Vec<LocalOrder> = self
            .scan()?
            .into_iter()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .filter(|o| {
                query
                    .customer_id
                    .as_deref()
                    .is_none_or(|c| o.customer_id == c)
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = orders.len();
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let page = orders.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    /// Ids of orders still waiting for the ERP
    pub fn pending_sync_orders(&self) -> StorageResult<Vec<LocalOrder>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|o| o.status == OrderStatus::PendingSync)
            .collect())
    }
}
