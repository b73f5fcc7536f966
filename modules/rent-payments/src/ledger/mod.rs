//! Payment ledger: one record per processor payment intent.
//!
//! Both writers (the confirmation bridge and the webhook reconciler) go
//! through [`PaymentLedger::record_outcome`] or
//! [`PaymentLedger::apply_status`], which are atomic per external reference
//! in every backend. Illegal transitions are reported, never applied.

pub mod memory;
pub mod postgres;
pub mod status;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;
pub use status::{IllegalTransition, PaymentStatus, Transition};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewPaymentRecord, PaymentRecord};

/// What a ledger write did to the record for an external reference
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerWrite {
    Created(PaymentRecord),
    Updated {
        record: PaymentRecord,
        from: PaymentStatus,
    },
    /// Record already carried the requested status
    Unchanged(PaymentRecord),
    /// Requested status is not reachable from the current one; record untouched
    Rejected {
        record: PaymentRecord,
        requested: PaymentStatus,
    },
}

impl LedgerWrite {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            LedgerWrite::Created(record)
            | LedgerWrite::Updated { record, .. }
            | LedgerWrite::Unchanged(record)
            | LedgerWrite::Rejected { record, .. } => record,
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            LedgerWrite::Created(_) => "created",
            LedgerWrite::Updated { .. } => "updated",
            LedgerWrite::Unchanged(_) => "unchanged",
            LedgerWrite::Rejected { .. } => "rejected",
        }
    }
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn find_by_external_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Insert the outcome, or move the existing record for the same external
    /// reference to `record.status`.
    async fn record_outcome(&self, record: NewPaymentRecord) -> Result<LedgerWrite, StoreError>;

    /// Move an existing record to `status`. Returns `None` when nothing is
    /// recorded for the reference; no record is created.
    async fn apply_status(
        &self,
        external_reference: &str,
        status: PaymentStatus,
    ) -> Result<Option<LedgerWrite>, StoreError>;

    /// Records owned by a property manager, newest payment first
    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Apply `requested` to `current` in memory. Shared by every backend so the
/// state machine is enforced in one place.
pub(crate) fn transition_record(
    mut current: PaymentRecord,
    requested: PaymentStatus,
) -> LedgerWrite {
    match current.status.transition(requested) {
        Ok(Transition::Unchanged) => LedgerWrite::Unchanged(current),
        Ok(Transition::Changed { from, to }) => {
            current.status = to;
            current.updated_at = Utc::now();
            LedgerWrite::Updated {
                record: current,
                from,
            }
        }
        Err(IllegalTransition { .. }) => LedgerWrite::Rejected {
            record: current,
            requested,
        },
    }
}

pub(crate) fn ensure_initial(record: &NewPaymentRecord) -> Result<(), StoreError> {
    if record.status.is_initial() {
        Ok(())
    } else {
        Err(StoreError::InvalidInitialStatus(record.status))
    }
}
