//! `mise-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, ItemId, LocationId, SupplierId, TransactionId, UserId};
pub use version::ExpectedVersion;
