use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use mise_core::{DocumentId, DomainError, DomainResult, ItemId, LocationId, SupplierId, UserId};

/// Movement document status lifecycle. Approved is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Approved,
}

/// Coarse movement type, also stamped on every ledger entry as its
/// `reference_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    Import,
    Export,
    Adjustment,
}

/// Why stock leaves a location. `Transfer` additionally credits a
/// destination location during approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportReason {
    Production,
    Transfer,
    Disposal,
    Return,
    Sample,
}

/// Why a count differs from the book quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentReason {
    Count,
    Damage,
    Loss,
    Found,
    Expired,
    Other,
}

/// Tagged movement kind. One approval algorithm handles all three variants;
/// the kind only decides per-line delta computation and the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MovementKind {
    Import {
        supplier_id: Option<SupplierId>,
    },
    Export {
        reason: ExportReason,
        destination: Option<LocationId>,
    },
    Adjustment {
        reason: AdjustmentReason,
    },
}

impl MovementKind {
    pub fn movement_type(&self) -> MovementType {
        match self {
            MovementKind::Import { .. } => MovementType::Import,
            MovementKind::Export { .. } => MovementType::Export,
            MovementKind::Adjustment { .. } => MovementType::Adjustment,
        }
    }

    /// Document id prefix, part of the persisted id shape.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            MovementKind::Import { .. } => "IM",
            MovementKind::Export { reason, .. } => match reason {
                ExportReason::Transfer => "TR",
                ExportReason::Disposal => "DS",
                _ => "EX",
            },
            MovementKind::Adjustment { .. } => "ADJ",
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            MovementKind::Export {
                reason: ExportReason::Transfer,
                ..
            }
        )
    }

    /// Destination location for transfers; `None` otherwise.
    pub fn transfer_destination(&self) -> Option<LocationId> {
        match self {
            MovementKind::Export {
                reason: ExportReason::Transfer,
                destination,
            } => *destination,
            _ => None,
        }
    }

    fn validate(&self, source: LocationId) -> DomainResult<()> {
        match self {
            MovementKind::Export {
                reason: ExportReason::Transfer,
                destination,
            } => match destination {
                None => Err(DomainError::validation(
                    "transfer exports require a destination location",
                )),
                Some(dest) if *dest == source => Err(DomainError::validation(
                    "transfer destination must differ from the source location",
                )),
                Some(_) => Ok(()),
            },
            MovementKind::Export {
                destination: Some(_),
                ..
            } => Err(DomainError::validation(
                "only transfer exports may carry a destination location",
            )),
            _ => Ok(()),
        }
    }
}

/// The quantity payload of one line.
///
/// Import/export lines describe a delta; adjustment lines describe the
/// counted target quantity, not a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEntry {
    Delta {
        quantity: i64,
    },
    Recount {
        counted_before: i64,
        counted_after: i64,
    },
}

impl LineEntry {
    /// Signed quantity used for document valuation. For recounts this uses
    /// the counted pair as recorded on the sheet; the ledger itself computes
    /// its signed quantity against the balance read at write time.
    pub fn valuation_quantity(&self) -> i64 {
        match self {
            LineEntry::Delta { quantity } => *quantity,
            LineEntry::Recount {
                counted_before,
                counted_after,
            } => counted_after - counted_before,
        }
    }
}

/// One line of a movement document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    pub item_id: ItemId,
    pub unit: String,
    pub entry: LineEntry,
    /// Price (imports/exports) or unit cost (adjustments) in minor currency
    /// units per unit of `unit`.
    pub unit_price: Option<i64>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl MovementLine {
    /// Line total in minor currency units, when a price is known. `None` for
    /// unpriced lines; overflow is rejected during draft validation, so a
    /// validated line always has a computable total.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price
            .and_then(|price| self.entry.valuation_quantity().checked_mul(price))
    }

    fn validate(&self, kind: &MovementKind) -> DomainResult<()> {
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("line unit cannot be empty"));
        }
        if self.unit_price.is_some() && self.line_total().is_none() {
            return Err(DomainError::validation("line total overflows"));
        }
        match (kind, &self.entry) {
            (MovementKind::Import { .. } | MovementKind::Export { .. }, LineEntry::Delta { quantity }) => {
                if *quantity <= 0 {
                    return Err(DomainError::validation(
                        "line quantity must be positive",
                    ));
                }
                Ok(())
            }
            (MovementKind::Adjustment { .. }, LineEntry::Recount { counted_before, counted_after }) => {
                if *counted_before < 0 || *counted_after < 0 {
                    return Err(DomainError::validation(
                        "counted quantities cannot be negative",
                    ));
                }
                Ok(())
            }
            (MovementKind::Adjustment { .. }, LineEntry::Delta { .. }) => Err(
                DomainError::validation("adjustment lines carry a recount, not a delta"),
            ),
            (_, LineEntry::Recount { .. }) => Err(DomainError::validation(
                "import/export lines carry a delta, not a recount",
            )),
        }
    }
}

/// Caller-supplied draft content, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub location_id: LocationId,
    pub document_date: NaiveDate,
    pub kind: MovementKind,
    pub lines: Vec<MovementLine>,
    pub notes: Option<String>,
}

impl DocumentDraft {
    fn validate(&self) -> DomainResult<()> {
        self.kind.validate(self.location_id)?;
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "document must have at least one line",
            ));
        }
        for line in &self.lines {
            line.validate(&self.kind)?;
        }
        self.lines
            .iter()
            .filter_map(MovementLine::line_total)
            .try_fold(0i64, i64::checked_add)
            .ok_or_else(|| DomainError::validation("document total overflows"))?;
        Ok(())
    }

    /// Sum of priced line totals. Callers validate first, so the sum is
    /// known not to overflow.
    fn total_amount(&self) -> i64 {
        self.lines.iter().filter_map(MovementLine::line_total).sum()
    }
}

/// A draft-then-approved record of an intended stock change.
///
/// Header and lines are mutable only while Draft; approval is one-way and
/// makes the document read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDocument {
    id: DocumentId,
    location_id: LocationId,
    document_date: NaiveDate,
    kind: MovementKind,
    status: DocumentStatus,
    lines: Vec<MovementLine>,
    /// Sum of priced line totals, in minor currency units.
    total_amount: i64,
    notes: Option<String>,
    created_by: UserId,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    version: u64,
}

impl MovementDocument {
    /// Validate a draft and mint a new Draft document with a generated id.
    pub fn create(draft: DocumentDraft, created_by: UserId) -> DomainResult<Self> {
        draft.validate()?;
        let id = DocumentId::generate(draft.kind.id_prefix(), draft.document_date);
        let total_amount = draft.total_amount();
        Ok(Self {
            id,
            location_id: draft.location_id,
            document_date: draft.document_date,
            kind: draft.kind,
            status: DocumentStatus::Draft,
            lines: draft.lines,
            total_amount,
            notes: draft.notes,
            created_by,
            approved_by: None,
            approved_at: None,
            version: 1,
        })
    }

    /// Replace header fields and the whole line set (Draft only). The id and
    /// creator are stable across updates; totals are recomputed.
    pub fn apply_draft(&mut self, draft: DocumentDraft) -> DomainResult<()> {
        self.ensure_draft("update")?;
        draft.validate()?;
        self.total_amount = draft.total_amount();
        self.location_id = draft.location_id;
        self.document_date = draft.document_date;
        self.kind = draft.kind;
        self.lines = draft.lines;
        self.notes = draft.notes;
        self.version += 1;
        Ok(())
    }

    /// Flip Draft → Approved and stamp the audit fields. Re-approval is
    /// rejected, not a no-op, so callers cannot silently double-apply.
    pub fn approve(&mut self, actor: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_draft("approve")?;
        self.status = DocumentStatus::Approved;
        self.approved_by = Some(actor);
        self.approved_at = Some(now);
        self.version += 1;
        Ok(())
    }

    pub fn ensure_draft(&self, action: &str) -> DomainResult<()> {
        match self.status {
            DocumentStatus::Draft => Ok(()),
            DocumentStatus::Approved => Err(DomainError::invariant(format!(
                "cannot {action} an approved document"
            ))),
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn document_date(&self) -> NaiveDate {
        self.document_date
    }

    pub fn kind(&self) -> &MovementKind {
        &self.kind
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn lines(&self) -> &[MovementLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
