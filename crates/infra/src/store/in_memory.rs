use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use mise_core::{DocumentId, ExpectedVersion, ItemId, LocationId};
use mise_inventory::{MovementDocument, StockBalance, StockTransaction};

use super::r#trait::{
    ApprovalCommit, DocumentFilter, MovementStore, StoreError, TransactionFilter,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct BalanceKey {
    location_id: LocationId,
    item_id: ItemId,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentId, MovementDocument>,
    balances: HashMap<BalanceKey, StockBalance>,
    transactions: Vec<StockTransaction>,
}

/// In-memory movement store.
///
/// Intended for tests/dev. The write lock doubles as the commit's exclusive
/// section: every expectation in an `ApprovalCommit` is validated before the
/// first write, so a failed commit leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<Inner>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

fn check_version(expected: ExpectedVersion, actual: u64) -> Result<(), StoreError> {
    if expected.matches(actual) {
        Ok(())
    } else {
        Err(StoreError::Concurrency(format!(
            "expected {expected:?}, found {actual}"
        )))
    }
}

impl MovementStore for InMemoryMovementStore {
    fn insert_document(&self, document: &MovementDocument) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.documents.contains_key(document.id()) {
            return Err(StoreError::DuplicateDocument(document.id().to_string()));
        }
        inner
            .documents
            .insert(document.id().clone(), document.clone());
        Ok(())
    }

    fn update_document(
        &self,
        document: &MovementDocument,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let stored = inner
            .documents
            .get(document.id())
            .ok_or(StoreError::NotFound)?;
        check_version(expected, stored.version())?;
        inner
            .documents
            .insert(document.id().clone(), document.clone());
        Ok(())
    }

    fn delete_document(
        &self,
        id: &DocumentId,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let stored = inner.documents.get(id).ok_or(StoreError::NotFound)?;
        check_version(expected, stored.version())?;
        inner.documents.remove(id);
        Ok(())
    }

    fn document(&self, id: &DocumentId) -> Result<Option<MovementDocument>, StoreError> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    fn documents(&self, filter: &DocumentFilter) -> Result<Vec<MovementDocument>, StoreError> {
        let inner = self.read()?;
        let mut matched: Vec<MovementDocument> = inner
            .documents
            .values()
            .filter(|doc| {
                filter.location_id.is_none_or(|l| doc.location_id() == l)
                    && filter
                        .movement_type
                        .is_none_or(|t| doc.kind().movement_type() == t)
                    && filter.status.is_none_or(|s| doc.status() == s)
                    && filter.from_date.is_none_or(|d| doc.document_date() >= d)
                    && filter.to_date.is_none_or(|d| doc.document_date() <= d)
            })
            .cloned()
            .collect();
        // Newest first; the id's date + UUIDv7 suffix breaks same-day ties.
        matched.sort_by(|a, b| {
            b.document_date()
                .cmp(&a.document_date())
                .then_with(|| b.id().as_str().cmp(a.id().as_str()))
        });
        Ok(matched)
    }

    fn balance(
        &self,
        location_id: LocationId,
        item_id: ItemId,
    ) -> Result<Option<StockBalance>, StoreError> {
        let key = BalanceKey {
            location_id,
            item_id,
        };
        Ok(self.read()?.balances.get(&key).cloned())
    }

    fn balances(&self, location_id: LocationId) -> Result<Vec<StockBalance>, StoreError> {
        let inner = self.read()?;
        let mut rows: Vec<StockBalance> = inner
            .balances
            .values()
            .filter(|b| b.location_id == location_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.item_id.as_uuid().cmp(b.item_id.as_uuid()));
        Ok(rows)
    }

    fn set_stock_levels(
        &self,
        location_id: LocationId,
        item_id: ItemId,
        min_level: Option<i64>,
        max_level: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<StockBalance, StoreError> {
        let mut inner = self.write()?;
        let key = BalanceKey {
            location_id,
            item_id,
        };
        let row = inner.balances.get_mut(&key).ok_or(StoreError::NotFound)?;
        row.min_level = min_level;
        row.max_level = max_level;
        row.last_updated = now;
        row.version += 1;
        Ok(row.clone())
    }

    fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<StockTransaction>, StoreError> {
        let inner = self.read()?;
        let mut matched: Vec<StockTransaction> = inner
            .transactions
            .iter()
            .filter(|t| {
                filter.location_id.is_none_or(|l| t.location_id == l)
                    && filter.item_id.is_none_or(|i| t.item_id == i)
                    && filter.kind.is_none_or(|k| t.kind == k)
                    && filter.from.is_none_or(|from| t.occurred_at >= from)
                    && filter.to.is_none_or(|to| t.occurred_at <= to)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(matched)
    }

    fn commit_approval(&self, commit: ApprovalCommit) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        // Validate every expectation before the first write.
        let stored = inner
            .documents
            .get(commit.document.id())
            .ok_or(StoreError::NotFound)?;
        check_version(
            ExpectedVersion::Exact(commit.expected_document_version),
            stored.version(),
        )?;

        for write in &commit.balances {
            let key = BalanceKey {
                location_id: write.balance.location_id,
                item_id: write.balance.item_id,
            };
            let actual = inner.balances.get(&key).map(|b| b.version).unwrap_or(0);
            check_version(ExpectedVersion::Exact(write.expected_version), actual)?;
        }

        // All checks passed; apply the whole unit.
        inner
            .documents
            .insert(commit.document.id().clone(), commit.document);
        for write in commit.balances {
            let key = BalanceKey {
                location_id: write.balance.location_id,
                item_id: write.balance.item_id,
            };
            inner.balances.insert(key, write.balance);
        }
        inner.transactions.extend(commit.transactions);
        Ok(())
    }
}
