//! Movement store boundary.
//!
//! This module defines the repository port the approval engine writes
//! through, without making any storage assumptions. Quantity-affecting
//! writes only exist as one atomic `commit_approval`; there is no way to
//! mutate a balance without shipping its paired ledger entries in the same
//! commit.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryMovementStore;
pub use r#trait::{
    ApprovalCommit, BalanceWrite, DocumentFilter, MovementStore, StoreError, TransactionFilter,
};
