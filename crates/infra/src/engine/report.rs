use chrono::{DateTime, Utc};
use serde::Serialize;

use warehouse_core::{ProductId, WarehouseId};

/// What reconciliation did with one counted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Recorded quantity already matched the count.
    Unchanged { quantity: u64 },
    /// Recorded quantity was overwritten with the count.
    Adjusted { from: u64, to: u64 },
    /// No zone-less record existed; one was created with the count.
    Created { quantity: u64 },
    /// The entry could not be applied; the remaining entries were still processed.
    Failed { reason: String },
}

impl EntryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, EntryOutcome::Failed { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(
            self,
            EntryOutcome::Adjusted { .. } | EntryOutcome::Created { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileEntry {
    pub product_id: ProductId,
    pub counted: u64,
    pub outcome: EntryOutcome,
}

/// Per-entry result of a reconciliation run.
///
/// The run itself is best-effort: it succeeds once every entry has been
/// attempted, and individual failures are reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub warehouse_id: WarehouseId,
    pub reconciled_at: DateTime<Utc>,
    pub entries: Vec<ReconcileEntry>,
}

impl ReconcileReport {
    pub fn failures(&self) -> impl Iterator<Item = &ReconcileEntry> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_change()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome_for(&self, product_id: ProductId) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| &e.outcome)
    }
}
