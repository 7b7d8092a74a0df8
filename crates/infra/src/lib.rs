//! Infrastructure layer: storage ports, in-memory backends, approval engine.

pub mod engine;
pub mod master_data;
pub mod store;


pub use engine::{ApprovalEngine, EngineError};
pub use master_data::{InMemoryMasterData, MasterData};
pub use store::{
    ApprovalCommit, BalanceWrite, DocumentFilter, InMemoryMovementStore, MovementStore,
    StoreError, TransactionFilter,
};
