//! Movement approval engine (application-level orchestration).
//!
//! One pipeline handles every movement kind: load the Draft document, check
//! preconditions, compute the post-state balances and their paired ledger
//! entries line by line, then hand the whole unit to the store's atomic
//! `commit_approval`. The kind only decides the per-line delta computation
//! (import credits, export debits, adjustment sets an absolute target,
//! transfer additionally credits the destination).
//!
//! The engine holds no state of its own; the store and the master-data
//! lookup are injected, which keeps it testable against in-memory backends
//! and swappable with real ones.

use chrono::{DateTime, Utc};

use mise_core::{DocumentId, DomainError, ExpectedVersion, ItemId, LocationId, UserId};
use mise_inventory::{
    DocumentDraft, LineEntry, MovementDocument, MovementKind, StockBalance, StockTransaction,
    TransactionKind,
};

use crate::master_data::MasterData;
use crate::store::{
    ApprovalCommit, BalanceWrite, DocumentFilter, MovementStore, StoreError, TransactionFilter,
};

/// Engine-level error surfaced to callers.
///
/// The variants preserve the taxonomy a transport layer needs: validation and
/// business-rule failures map to client errors, `NotFound` to 404, store
/// failures to server errors. Deterministic failures never leave partial
/// state; a store failure aborts the in-flight atomic unit wholesale.
#[derive(Debug)]
pub enum EngineError {
    /// Input failed validation (malformed draft, unknown reference).
    Validation(String),
    /// Business rule violated (e.g. mutating an approved document).
    InvariantViolation(String),
    /// An export line asked for more than the source location holds.
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },
    /// Unknown document id.
    NotFound,
    /// A concurrent writer won; the operation is safely retryable.
    Concurrency(String),
    /// Persistence failure; the document remains in its pre-call state.
    Store(StoreError),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::NotFound => EngineError::NotFound,
            DomainError::Conflict(msg) => EngineError::Concurrency(msg),
            DomainError::InsufficientStock {
                item,
                available,
                requested,
            } => EngineError::InsufficientStock {
                item,
                available,
                requested,
            },
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => EngineError::Concurrency(msg),
            StoreError::NotFound => EngineError::NotFound,
            _ => EngineError::Store(value),
        }
    }
}

/// Working copy of every balance row an approval touches, keyed by
/// `(location, item)`. Rows are loaded once (or opened at zero) and mutated
/// in document-line order, so a later line sees the effect of an earlier one
/// on the same key.
struct WorkingBalances<'a, S> {
    store: &'a S,
    rows: Vec<BalanceWrite>,
}

impl<'a, S: MovementStore> WorkingBalances<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            rows: Vec::new(),
        }
    }

    fn entry(
        &mut self,
        location_id: LocationId,
        item_id: ItemId,
        unit: &str,
        now: DateTime<Utc>,
    ) -> Result<&mut StockBalance, StoreError> {
        let pos = self.rows.iter().position(|row| {
            row.balance.location_id == location_id && row.balance.item_id == item_id
        });
        let pos = match pos {
            Some(pos) => pos,
            None => {
                let balance = self
                    .store
                    .balance(location_id, item_id)?
                    .unwrap_or_else(|| StockBalance::opening(location_id, item_id, unit, now));
                let expected_version = balance.version;
                self.rows.push(BalanceWrite {
                    balance,
                    expected_version,
                });
                self.rows.len() - 1
            }
        };
        Ok(&mut self.rows[pos].balance)
    }

    fn into_writes(self) -> Vec<BalanceWrite> {
        self.rows
    }
}

/// The approval state machine plus movement-document lifecycle operations.
pub struct ApprovalEngine<S, M> {
    store: S,
    master_data: M,
}

impl<S, M> ApprovalEngine<S, M> {
    pub fn new(store: S, master_data: M) -> Self {
        Self { store, master_data }
    }
}

impl<S, M> ApprovalEngine<S, M>
where
    S: MovementStore,
    M: MasterData,
{
    /// Create a movement document in Draft.
    pub fn create_document(
        &self,
        draft: DocumentDraft,
        actor: UserId,
    ) -> Result<MovementDocument, EngineError> {
        self.check_references(&draft)?;
        let document = MovementDocument::create(draft, actor)?;
        self.store.insert_document(&document)?;
        tracing::info!("created movement document {}", document.id());
        Ok(document)
    }

    /// Replace a Draft document's header and lines wholesale.
    pub fn update_document(
        &self,
        id: &DocumentId,
        draft: DocumentDraft,
    ) -> Result<MovementDocument, EngineError> {
        let mut document = self.load(id)?;
        self.check_references(&draft)?;
        let expected = ExpectedVersion::Exact(document.version());
        document.apply_draft(draft)?;
        self.store.update_document(&document, expected)?;
        Ok(document)
    }

    /// Delete a Draft document and its lines.
    pub fn delete_document(&self, id: &DocumentId) -> Result<(), EngineError> {
        let document = self.load(id)?;
        document.ensure_draft("delete")?;
        self.store
            .delete_document(id, ExpectedVersion::Exact(document.version()))?;
        tracing::info!("deleted draft movement document {id}");
        Ok(())
    }

    /// Approve a Draft document: validate preconditions, compute the ledger
    /// entries and post-state balances, and commit everything as one atomic
    /// unit. Either every write lands or none do.
    pub fn approve(
        &self,
        id: &DocumentId,
        actor: UserId,
    ) -> Result<MovementDocument, EngineError> {
        let mut document = self.load(id)?;
        let expected_document_version = document.version();
        let now = Utc::now();
        document.approve(actor, now)?;

        let mut working = WorkingBalances::new(&self.store);
        let mut entries = Vec::new();
        let source = document.location_id();
        let reference_type = document.kind().movement_type();

        for line in document.lines() {
            match (document.kind(), &line.entry) {
                (MovementKind::Import { .. }, LineEntry::Delta { quantity }) => {
                    let balance = working.entry(source, line.item_id, &line.unit, now)?;
                    let pair = balance.apply_delta(*quantity, &line.unit, now)?;
                    entries.push(StockTransaction::record(
                        source,
                        line.item_id,
                        TransactionKind::Import,
                        *quantity,
                        &line.unit,
                        pair,
                        reference_type,
                        id.clone(),
                        now,
                        actor,
                    ));
                }
                (MovementKind::Export { .. }, LineEntry::Delta { quantity }) => {
                    let balance = working.entry(source, line.item_id, &line.unit, now)?;
                    let available = balance.quantity;
                    if *quantity > available {
                        tracing::warn!(
                            "rejected approval of {id}: insufficient stock for item {}",
                            line.item_id
                        );
                        return Err(DomainError::insufficient_stock(
                            line.item_id.to_string(),
                            available,
                            *quantity,
                        )
                        .into());
                    }
                    let pair = balance.apply_delta(-quantity, &line.unit, now)?;
                    entries.push(StockTransaction::record(
                        source,
                        line.item_id,
                        TransactionKind::Export,
                        -quantity,
                        &line.unit,
                        pair,
                        reference_type,
                        id.clone(),
                        now,
                        actor,
                    ));

                    if let Some(destination) = document.kind().transfer_destination() {
                        let balance =
                            working.entry(destination, line.item_id, &line.unit, now)?;
                        let pair = balance.apply_delta(*quantity, &line.unit, now)?;
                        entries.push(StockTransaction::record(
                            destination,
                            line.item_id,
                            TransactionKind::TransferIn,
                            *quantity,
                            &line.unit,
                            pair,
                            reference_type,
                            id.clone(),
                            now,
                            actor,
                        ));
                    }
                }
                (MovementKind::Adjustment { .. }, LineEntry::Recount { counted_after, .. }) => {
                    let balance = working.entry(source, line.item_id, &line.unit, now)?;
                    let pair = balance.set_absolute(*counted_after, &line.unit, now);
                    let signed = pair.1 - pair.0;
                    entries.push(StockTransaction::record(
                        source,
                        line.item_id,
                        TransactionKind::for_adjustment(signed),
                        signed,
                        &line.unit,
                        pair,
                        reference_type,
                        id.clone(),
                        now,
                        actor,
                    ));
                }
                _ => {
                    return Err(EngineError::InvariantViolation(
                        "line entry does not match the document kind".to_string(),
                    ));
                }
            }
        }

        let entry_count = entries.len();
        self.store.commit_approval(ApprovalCommit {
            document: document.clone(),
            expected_document_version,
            balances: working.into_writes(),
            transactions: entries,
        })?;
        tracing::info!("approved movement document {id} ({entry_count} ledger entries)");
        Ok(document)
    }

    pub fn document(&self, id: &DocumentId) -> Result<MovementDocument, EngineError> {
        self.load(id)
    }

    pub fn documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<MovementDocument>, EngineError> {
        Ok(self.store.documents(filter)?)
    }

    pub fn balance(
        &self,
        location_id: LocationId,
        item_id: ItemId,
    ) -> Result<Option<StockBalance>, EngineError> {
        Ok(self.store.balance(location_id, item_id)?)
    }

    /// Current quantity for a key; absent rows read as zero.
    pub fn quantity_on_hand(
        &self,
        location_id: LocationId,
        item_id: ItemId,
    ) -> Result<i64, EngineError> {
        Ok(self
            .store
            .balance(location_id, item_id)?
            .map(|b| b.quantity)
            .unwrap_or(0))
    }

    pub fn balances(&self, location_id: LocationId) -> Result<Vec<StockBalance>, EngineError> {
        Ok(self.store.balances(location_id)?)
    }

    /// Balances at or below their reorder floor.
    pub fn low_stock(&self, location_id: LocationId) -> Result<Vec<StockBalance>, EngineError> {
        let mut rows = self.store.balances(location_id)?;
        rows.retain(StockBalance::is_below_min);
        Ok(rows)
    }

    /// Maintain reorder bounds on an existing balance row.
    pub fn set_stock_levels(
        &self,
        location_id: LocationId,
        item_id: ItemId,
        min_level: Option<i64>,
        max_level: Option<i64>,
    ) -> Result<StockBalance, EngineError> {
        Ok(self
            .store
            .set_stock_levels(location_id, item_id, min_level, max_level, Utc::now())?)
    }

    pub fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<StockTransaction>, EngineError> {
        Ok(self.store.transactions(filter)?)
    }

    fn load(&self, id: &DocumentId) -> Result<MovementDocument, EngineError> {
        self.store.document(id)?.ok_or(EngineError::NotFound)
    }

    fn check_references(&self, draft: &DocumentDraft) -> Result<(), EngineError> {
        if !self.master_data.location_exists(draft.location_id) {
            return Err(EngineError::Validation(format!(
                "unknown location: {}",
                draft.location_id
            )));
        }
        if let MovementKind::Import {
            supplier_id: Some(supplier_id),
        } = draft.kind
        {
            if !self.master_data.supplier_exists(supplier_id) {
                return Err(EngineError::Validation(format!(
                    "unknown supplier: {supplier_id}"
                )));
            }
        }
        if let Some(destination) = draft.kind.transfer_destination() {
            if !self.master_data.location_exists(destination) {
                return Err(EngineError::Validation(format!(
                    "unknown destination location: {destination}"
                )));
            }
        }
        for line in &draft.lines {
            if !self.master_data.item_exists(line.item_id) {
                return Err(EngineError::Validation(format!(
                    "unknown item: {}",
                    line.item_id
                )));
            }
        }
        Ok(())
    }
}
