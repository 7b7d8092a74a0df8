use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mise_core::{DocumentId, ItemId, LocationId, TransactionId, UserId};

use crate::document::MovementType;

/// Kind of one ledger entry.
///
/// `Adjustment` is the neutral kind written when a recount matched the book
/// quantity exactly; it carries a zero signed quantity and exists for audit
/// completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Import,
    Export,
    AdjustmentIn,
    AdjustmentOut,
    Adjustment,
    TransferIn,
}

impl TransactionKind {
    /// Pick the adjustment kind from the signed difference between the
    /// counted target and the balance read at write time.
    pub fn for_adjustment(signed_quantity: i64) -> Self {
        if signed_quantity > 0 {
            TransactionKind::AdjustmentIn
        } else if signed_quantity < 0 {
            TransactionKind::AdjustmentOut
        } else {
            TransactionKind::Adjustment
        }
    }
}

/// One immutable ledger entry — the audit source of truth for a single
/// balance mutation. Never updated or deleted after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: TransactionId,
    pub location_id: LocationId,
    pub item_id: ItemId,
    pub kind: TransactionKind,
    pub signed_quantity: i64,
    pub unit: String,
    pub quantity_before: i64,
    pub quantity_after: i64,
    /// Back-link to the originating movement document; always present.
    pub reference_type: MovementType,
    pub reference_id: DocumentId,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: UserId,
}

impl StockTransaction {
    /// Record a balance mutation. `quantity_before`/`quantity_after` are the
    /// pair read from the balance at write time, never caller-supplied.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        location_id: LocationId,
        item_id: ItemId,
        kind: TransactionKind,
        signed_quantity: i64,
        unit: &str,
        (quantity_before, quantity_after): (i64, i64),
        reference_type: MovementType,
        reference_id: DocumentId,
        occurred_at: DateTime<Utc>,
        actor_id: UserId,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            location_id,
            item_id,
            kind,
            signed_quantity,
            unit: unit.to_string(),
            quantity_before,
            quantity_after,
            reference_type,
            reference_id,
            occurred_at,
            actor_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn adjustment_kind_follows_the_sign() {
        assert_eq!(
            TransactionKind::for_adjustment(5),
            TransactionKind::AdjustmentIn
        );
        assert_eq!(
            TransactionKind::for_adjustment(-5),
            TransactionKind::AdjustmentOut
        );
        assert_eq!(
            TransactionKind::for_adjustment(0),
            TransactionKind::Adjustment
        );
    }

    #[test]
    fn record_links_back_to_the_document() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let reference_id = DocumentId::generate("IM", date);
        let entry = StockTransaction::record(
            LocationId::new(),
            ItemId::new(),
            TransactionKind::Import,
            10,
            "kg",
            (0, 10),
            MovementType::Import,
            reference_id.clone(),
            Utc::now(),
            UserId::new(),
        );
        assert_eq!(entry.reference_id, reference_id);
        assert_eq!(entry.reference_type, MovementType::Import);
        assert_eq!((entry.quantity_before, entry.quantity_after), (0, 10));
    }

    #[test]
    fn kinds_serialize_in_the_persisted_shape() {
        let json = serde_json::to_string(&TransactionKind::TransferIn).unwrap();
        assert_eq!(json, "\"TRANSFER_IN\"");
        let json = serde_json::to_string(&TransactionKind::AdjustmentOut).unwrap();
        assert_eq!(json, "\"ADJUSTMENT_OUT\"");
    }
}
