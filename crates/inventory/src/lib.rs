//! Inventory domain module (balances, ledger entries, movement documents).
//!
//! This crate contains business rules for stock movement, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod balance;
pub mod document;
pub mod transaction;

pub use balance::StockBalance;
pub use document::{
    AdjustmentReason, DocumentDraft, DocumentStatus, ExportReason, LineEntry, MovementDocument,
    MovementKind, MovementLine, MovementType,
};
pub use transaction::{StockTransaction, TransactionKind};
