use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Directory, Payee, TenantClient};
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn linked_client(&self, tenant_user_id: Uuid) -> Result<Option<TenantClient>, StoreError> {
        let client = sqlx::query_as::<_, TenantClient>(
            r#"
            SELECT id, owner_user_id, linked_user_id, name, rent_amount
            FROM clients
            WHERE linked_user_id = $1
            "#,
        )
        .bind(tenant_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn client(&self, client_id: Uuid) -> Result<Option<TenantClient>, StoreError> {
        let client = sqlx::query_as::<_, TenantClient>(
            r#"
            SELECT id, owner_user_id, linked_user_id, name, rent_amount
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn payee(&self, user_id: Uuid) -> Result<Option<Payee>, StoreError> {
        let payee = sqlx::query_as::<_, Payee>(
            r#"
            SELECT id AS user_id, payout_account_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payee)
    }
}
