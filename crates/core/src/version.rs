//! Optimistic concurrency primitive.
//!
//! Documents and balance rows carry a version column; writers state the
//! version they based their write on and the store rejects stale writes.

use crate::error::{DomainError, DomainResult};

/// Version expectation checked by the store before a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for migrations and backfills).
    Any,
    /// Require the row to be at an exact version. Absent rows count as 0.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
