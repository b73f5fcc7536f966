use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{ensure_initial, transition_record, LedgerWrite, PaymentLedger, PaymentStatus};
use crate::error::StoreError;
use crate::models::{NewPaymentRecord, PaymentRecord};

const RECORD_COLUMNS: &str = "id, owner_user_id, client_id, amount, payment_date, \
     external_reference, status, notes, created_at, updated_at";

/// Row shape of payment_records; status is validated on conversion
#[derive(Debug, sqlx::FromRow)]
struct PaymentRecordRow {
    id: Uuid,
    owner_user_id: Uuid,
    client_id: Uuid,
    amount: Decimal,
    payment_date: DateTime<Utc>,
    external_reference: String,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRecordRow> for PaymentRecord {
    type Error = StoreError;

    fn try_from(row: PaymentRecordRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PaymentStatus>()
            .map_err(|e| StoreError::Corrupt(format!("payment_records.id={}: {}", row.id, e)))?;

        Ok(PaymentRecord {
            id: row.id,
            owner_user_id: row.owner_user_id,
            client_id: row.client_id,
            amount: row.amount,
            payment_date: row.payment_date,
            external_reference: row.external_reference,
            status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL ledger.
///
/// Writes run in a transaction: `INSERT … ON CONFLICT (external_reference) DO
/// NOTHING` claims the reference, and a losing writer locks the winner's row
/// with `SELECT … FOR UPDATE` before applying its transition.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_by_reference(
        tx: &mut Transaction<'_, Postgres>,
        external_reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records \
             WHERE external_reference = $1 FOR UPDATE"
        ))
        .bind(external_reference)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn update_status(
        tx: &mut Transaction<'_, Postgres>,
        record: &PaymentRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE payment_records
            SET status = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(record.status.as_str())
        .bind(record.updated_at)
        .bind(record.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Persist the write if it changed anything
    async fn persist(
        tx: &mut Transaction<'_, Postgres>,
        write: &LedgerWrite,
    ) -> Result<(), StoreError> {
        if let LedgerWrite::Updated { record, .. } = write {
            Self::update_status(tx, record).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentLedger for PgLedger {
    async fn find_by_external_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE external_reference = $1"
        ))
        .bind(external_reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn record_outcome(&self, record: NewPaymentRecord) -> Result<LedgerWrite, StoreError> {
        ensure_initial(&record)?;

        let external_reference = record.external_reference.clone();
        let requested = record.status;
        let candidate = record.into_record(Utc::now());

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, PaymentRecordRow>(&format!(
            r#"
            INSERT INTO payment_records ({RECORD_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (external_reference) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(candidate.id)
        .bind(candidate.owner_user_id)
        .bind(candidate.client_id)
        .bind(candidate.amount)
        .bind(candidate.payment_date)
        .bind(&candidate.external_reference)
        .bind(candidate.status.as_str())
        .bind(&candidate.notes)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_optional(&mut *tx)
        .await?;

        let write = match inserted {
            Some(row) => LedgerWrite::Created(PaymentRecord::try_from(row)?),
            None => {
                let current = Self::lock_by_reference(&mut tx, &external_reference)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!(
                            "conflict on {external_reference} but no row to lock"
                        ))
                    })?;
                let write = transition_record(current, requested);
                Self::persist(&mut tx, &write).await?;
                write
            }
        };

        tx.commit().await?;
        Ok(write)
    }

    async fn apply_status(
        &self,
        external_reference: &str,
        status: PaymentStatus,
    ) -> Result<Option<LedgerWrite>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = Self::lock_by_reference(&mut tx, external_reference).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let write = transition_record(current, status);
        Self::persist(&mut tx, &write).await?;
        tx.commit().await?;

        Ok(Some(write))
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records \
             WHERE owner_user_id = $1 ORDER BY payment_date DESC"
        ))
        .bind(owner_user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRecord::try_from).collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
