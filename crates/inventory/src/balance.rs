use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mise_core::{DomainError, DomainResult, ItemId, LocationId};

/// Current stock level of one item at one location.
///
/// Rows are created lazily on first movement; an absent row means zero. The
/// quantity always equals the signed sum of the ledger entries for the same
/// `(location, item)` key, which is why every mutation here must be paired
/// with a ledger entry inside the same atomic commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBalance {
    pub location_id: LocationId,
    pub item_id: ItemId,
    /// Quantity in whole units of `unit`.
    pub quantity: i64,
    pub unit: String,
    /// Reorder floor; `None` means no low-stock alerting for this row.
    pub min_level: Option<i64>,
    pub max_level: Option<i64>,
    pub last_updated: DateTime<Utc>,
    /// Optimistic concurrency column. Absent rows count as version 0; the
    /// first persisted write stores version 1.
    pub version: u64,
}

impl StockBalance {
    /// A zero-quantity row for a key that has never moved stock.
    pub fn opening(
        location_id: LocationId,
        item_id: ItemId,
        unit: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            location_id,
            item_id,
            quantity: 0,
            unit: unit.into(),
            min_level: None,
            max_level: None,
            last_updated: now,
            version: 0,
        }
    }

    /// Apply a signed delta and return the `(before, after)` pair read at
    /// write time. Rejects a delta that would drive the quantity negative.
    pub fn apply_delta(
        &mut self,
        delta: i64,
        unit: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<(i64, i64)> {
        let before = self.quantity;
        let after = before.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!(
                "stock quantity overflows (current: {before}, delta: {delta})"
            ))
        })?;
        if after < 0 {
            return Err(DomainError::invariant(format!(
                "stock cannot go negative (current: {before}, delta: {delta})"
            )));
        }
        self.quantity = after;
        self.unit = unit.to_string();
        self.last_updated = now;
        self.version += 1;
        Ok((before, after))
    }

    /// Set the quantity to an absolute target (adjustment approval) and
    /// return the `(before, after)` pair read at write time.
    pub fn set_absolute(&mut self, target: i64, unit: &str, now: DateTime<Utc>) -> (i64, i64) {
        let before = self.quantity;
        self.quantity = target;
        self.unit = unit.to_string();
        self.last_updated = now;
        self.version += 1;
        (before, target)
    }

    pub fn is_below_min(&self) -> bool {
        matches!(self.min_level, Some(min) if self.quantity <= min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_balance(quantity: i64) -> StockBalance {
        let mut balance =
            StockBalance::opening(LocationId::new(), ItemId::new(), "kg", Utc::now());
        balance.quantity = quantity;
        balance
    }

    #[test]
    fn apply_delta_returns_before_and_after() {
        let mut balance = test_balance(10);
        let (before, after) = balance.apply_delta(-4, "kg", Utc::now()).unwrap();
        assert_eq!((before, after), (10, 6));
        assert_eq!(balance.quantity, 6);
        assert_eq!(balance.version, 1);
    }

    #[test]
    fn apply_delta_rejects_overflow() {
        let mut balance = test_balance(i64::MAX);
        let err = balance.apply_delta(1, "kg", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(balance.quantity, i64::MAX);
        assert_eq!(balance.version, 0);
    }

    #[test]
    fn apply_delta_rejects_going_negative() {
        let mut balance = test_balance(3);
        let err = balance.apply_delta(-5, "kg", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(balance.quantity, 3);
        assert_eq!(balance.version, 0);
    }

    #[test]
    fn set_absolute_overwrites_regardless_of_prior_quantity() {
        let mut balance = test_balance(17);
        let (before, after) = balance.set_absolute(9, "kg", Utc::now());
        assert_eq!((before, after), (17, 9));
        assert_eq!(balance.quantity, 9);
    }

    #[test]
    fn below_min_only_when_floor_is_set() {
        let mut balance = test_balance(2);
        assert!(!balance.is_below_min());
        balance.min_level = Some(5);
        assert!(balance.is_below_min());
        balance.min_level = Some(1);
        assert!(!balance.is_below_min());
    }
}
