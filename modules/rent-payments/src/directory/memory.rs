use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{Directory, Payee, TenantClient};
use crate::error::StoreError;

#[derive(Clone, Default)]
pub struct MemoryDirectory {
    clients: Arc<DashMap<Uuid, TenantClient>>,
    payees: Arc<DashMap<Uuid, Payee>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_client(&self, client: TenantClient) {
        self.clients.insert(client.id, client);
    }

    pub fn upsert_payee(&self, payee: Payee) {
        self.payees.insert(payee.user_id, payee);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn linked_client(&self, tenant_user_id: Uuid) -> Result<Option<TenantClient>, StoreError> {
        Ok(self
            .clients
            .iter()
            .find(|c| c.linked_user_id == Some(tenant_user_id))
            .map(|c| c.value().clone()))
    }

    async fn client(&self, client_id: Uuid) -> Result<Option<TenantClient>, StoreError> {
        Ok(self.clients.get(&client_id).map(|c| c.value().clone()))
    }

    async fn payee(&self, user_id: Uuid) -> Result<Option<Payee>, StoreError> {
        Ok(self.payees.get(&user_id).map(|p| p.value().clone()))
    }
}
