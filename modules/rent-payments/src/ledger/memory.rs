//! In-memory ledger for tests and local development

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{ensure_initial, transition_record, LedgerWrite, PaymentLedger, PaymentStatus};
use crate::error::StoreError;
use crate::models::{NewPaymentRecord, PaymentRecord};

/// Ledger backed by a `DashMap` keyed by external reference.
///
/// The entry API holds the shard's write lock for the whole
/// read-transition-write, which gives the same per-reference atomicity as the
/// unique constraint plus row lock in PostgreSQL.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    records: Arc<DashMap<String, PaymentRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl PaymentLedger for MemoryLedger {
    async fn find_by_external_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self
            .records
            .get(external_reference)
            .map(|r| r.value().clone()))
    }

    async fn record_outcome(&self, record: NewPaymentRecord) -> Result<LedgerWrite, StoreError> {
        ensure_initial(&record)?;

        let write = match self.records.entry(record.external_reference.clone()) {
            Entry::Vacant(slot) => {
                let created = record.into_record(Utc::now());
                slot.insert(created.clone());
                LedgerWrite::Created(created)
            }
            Entry::Occupied(mut slot) => {
                let write = transition_record(slot.get().clone(), record.status);
                if let LedgerWrite::Updated { record, .. } = &write {
                    slot.insert(record.clone());
                }
                write
            }
        };

        Ok(write)
    }

    async fn apply_status(
        &self,
        external_reference: &str,
        status: PaymentStatus,
    ) -> Result<Option<LedgerWrite>, StoreError> {
        let Some(mut slot) = self.records.get_mut(external_reference) else {
            return Ok(None);
        };

        let write = transition_record(slot.value().clone(), status);
        if let LedgerWrite::Updated { record, .. } = &write {
            *slot.value_mut() = record.clone();
        }
        Ok(Some(write))
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError> {
        let mut records: Vec<PaymentRecord> = self
            .records
            .iter()
            .filter(|r| r.owner_user_id == owner_user_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
