//! Read-only view of the property-management records the payments core
//! needs: which client a tenant login is linked to, and where a property
//! manager receives payouts.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use crate::processor::IntentMetadata;

/// A property manager's client (the tenant's household)
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TenantClient {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub linked_user_id: Option<Uuid>,
    pub name: String,
    pub rent_amount: Option<Decimal>,
}

/// The receiving side of a rent payment
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Payee {
    pub user_id: Uuid,
    pub payout_account_id: Option<String>,
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Client record linked to a tenant's login
    async fn linked_client(&self, tenant_user_id: Uuid) -> Result<Option<TenantClient>, StoreError>;

    async fn client(&self, client_id: Uuid) -> Result<Option<TenantClient>, StoreError>;

    async fn payee(&self, user_id: Uuid) -> Result<Option<Payee>, StoreError>;

    /// Owner a payment is attributed to: the intent's payee, or the owner
    /// of its client when the intent predates payee metadata.
    async fn owner_for(&self, metadata: &IntentMetadata) -> Result<Option<Uuid>, StoreError> {
        if let Some(payee_id) = metadata.payee_id {
            return Ok(Some(payee_id));
        }
        Ok(self
            .client(metadata.client_id)
            .await?
            .map(|client| client.owner_user_id))
    }
}
