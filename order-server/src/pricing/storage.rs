//! redb price rule store
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `price_rules` | `rule_id` | `PriceOverrideRule` (JSON) |
//!
//! Listing order is creation order (`created_at`, then id), which is the
//! tie-break order the resolver sees for equal priorities.

use crate::db::{StorageResult, ensure_tables};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::models::price_rule::{PriceOverrideRule, RuleType};
use std::sync::Arc;

const PRICE_RULES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("price_rules");

#[derive(Clone)]
pub struct PriceRuleStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for PriceRuleStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceRuleStorage").finish_non_exhaustive()
    }
}

impl PriceRuleStorage {
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        ensure_tables(&db, &[PRICE_RULES_TABLE])?;
        Ok(Self { db })
    }

    /// Insert or replace
    pub fn put(&self, rule: &PriceOverrideRule) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PRICE_RULES_TABLE)?;
            let value = serde_json::to_vec(rule)?;
            table.insert(rule.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> StorageResult<Option<PriceOverrideRule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRICE_RULES_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn delete(&self, id: &str) -> StorageResult<Option<PriceOverrideRule>> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PRICE_RULES_TABLE)?;
            table
                .remove(id)?
                .map(|guard| serde_json::from_slice::<PriceOverrideRule>(guard.value()))
                .transpose()?
        };
        txn.commit()?;
        Ok(removed)
    }

    /// All rules, optionally of one type, in creation order
    pub fn list(&self, rule_type: Option<RuleType>) -> StorageResult<Vec<PriceOverrideRule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRICE_RULES_TABLE)?;

        let mut rules = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let rule: PriceOverrideRule = serde_json::from_slice(value.value())?;
            if rule_type.is_none_or(|t| rule.rule_type == t) {
                rules.push(rule);
            }
        }
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rules)
    }

    /// Rules with the kill switch on (time window is checked by the resolver)
    pub fn list_active(&self) -> StorageResult<Vec<PriceOverrideRule>> {
        let mut rules = self.list(None)?;
        rules.retain(|r| r.is_active);
        Ok(rules)
    }
}
