use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use mise_core::{DocumentId, ExpectedVersion, ItemId, LocationId};
use mise_inventory::{
    DocumentStatus, MovementDocument, MovementType, StockBalance, StockTransaction,
    TransactionKind,
};

/// Typed filter for document listings — one filter struct per query shape,
/// no string-built queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub location_id: Option<LocationId>,
    pub movement_type: Option<MovementType>,
    pub status: Option<DocumentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Typed filter for ledger queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub location_id: Option<LocationId>,
    pub item_id: Option<ItemId>,
    pub kind: Option<TransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// One post-state balance row plus the version the writer based it on.
/// Absent rows count as version 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceWrite {
    pub balance: StockBalance,
    pub expected_version: u64,
}

/// Everything one approval writes, applied atomically: the approved document,
/// every touched balance row, and the paired ledger entries. Either all of it
/// commits or none of it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalCommit {
    pub document: MovementDocument,
    /// Version of the Draft document the approval was computed from.
    pub expected_document_version: u64,
    pub balances: Vec<BalanceWrite>,
    pub transactions: Vec<StockTransaction>,
}

/// Movement store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Repository port for movement documents, balances, and the ledger.
///
/// Implementations must:
/// - enforce the version expectations on every write (stale writes are
///   rejected, never silently overwritten)
/// - apply `commit_approval` all-or-nothing: validate every expectation
///   before the first write, then write the document, the balance rows, and
///   the ledger entries as one unit
/// - keep the ledger append-only (entries are never updated or deleted)
pub trait MovementStore: Send + Sync {
    fn insert_document(&self, document: &MovementDocument) -> Result<(), StoreError>;

    fn update_document(
        &self,
        document: &MovementDocument,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn delete_document(
        &self,
        id: &DocumentId,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn document(&self, id: &DocumentId) -> Result<Option<MovementDocument>, StoreError>;

    /// Documents matching the filter, newest document date first.
    fn documents(&self, filter: &DocumentFilter) -> Result<Vec<MovementDocument>, StoreError>;

    fn balance(
        &self,
        location_id: LocationId,
        item_id: ItemId,
    ) -> Result<Option<StockBalance>, StoreError>;

    fn balances(&self, location_id: LocationId) -> Result<Vec<StockBalance>, StoreError>;

    /// Maintain the reorder bounds on an existing balance row. The quantity
    /// is untouched, so no ledger entry is involved.
    fn set_stock_levels(
        &self,
        location_id: LocationId,
        item_id: ItemId,
        min_level: Option<i64>,
        max_level: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<StockBalance, StoreError>;

    /// Ledger entries matching the filter, newest first.
    fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<StockTransaction>, StoreError>;

    /// Apply one approval atomically, rejecting it wholesale if the document
    /// or any touched balance moved since the approval was computed.
    fn commit_approval(&self, commit: ApprovalCommit) -> Result<(), StoreError>;
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn insert_document(&self, document: &MovementDocument) -> Result<(), StoreError> {
        (**self).insert_document(document)
    }

    fn update_document(
        &self,
        document: &MovementDocument,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).update_document(document, expected)
    }

    fn delete_document(
        &self,
        id: &DocumentId,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).delete_document(id, expected)
    }

    fn document(&self, id: &DocumentId) -> Result<Option<MovementDocument>, StoreError> {
        (**self).document(id)
    }

    fn documents(&self, filter: &DocumentFilter) -> Result<Vec<MovementDocument>, StoreError> {
        (**self).documents(filter)
    }

    fn balance(
        &self,
        location_id: LocationId,
        item_id: ItemId,
    ) -> Result<Option<StockBalance>, StoreError> {
        (**self).balance(location_id, item_id)
    }

    fn balances(&self, location_id: LocationId) -> Result<Vec<StockBalance>, StoreError> {
        (**self).balances(location_id)
    }

    fn set_stock_levels(
        &self,
        location_id: LocationId,
        item_id: ItemId,
        min_level: Option<i64>,
        max_level: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<StockBalance, StoreError> {
        (**self).set_stock_levels(location_id, item_id, min_level, max_level, now)
    }

    fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).transactions(filter)
    }

    fn commit_approval(&self, commit: ApprovalCommit) -> Result<(), StoreError> {
        (**self).commit_approval(commit)
    }
}
