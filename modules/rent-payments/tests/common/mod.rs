#![allow(dead_code)]

use async_trait::async_trait;
use auth_kit::{JwtKeys, Role};
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::Utc;
use dashmap::DashMap;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use rent_payments_rs::directory::{MemoryDirectory, Payee, TenantClient};
use rent_payments_rs::error::StoreError;
use rent_payments_rs::ledger::{LedgerWrite, MemoryLedger, PaymentStatus};
use rent_payments_rs::models::{NewPaymentRecord, PaymentRecord};
use rent_payments_rs::processor::types::{CLIENT_ID_KEY, PAYEE_ID_KEY, PAYER_ID_KEY};
use rent_payments_rs::processor::webhook::{sign_payload, verify_webhook_signature, SIGNATURE_HEADER};
use rent_payments_rs::processor::{
    AccountLink, CreateIntentParams, Metadata, PaymentIntent, PaymentProcessor, PayoutAccount,
    ProcessorError,
};
use rent_payments_rs::{payments_router, AppState, PaymentLedger, PaymentSettings};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const JWT_SECRET: &[u8] = b"test-jwt-secret";

/// In-process stand-in for the card processor
#[derive(Default)]
pub struct MockProcessor {
    accounts: DashMap<String, PayoutAccount>,
    intents: DashMap<String, PaymentIntent>,
    created: Mutex<Vec<CreateIntentParams>>,
    next_id: AtomicU64,
}

impl MockProcessor {
    pub fn add_account(&self, account: PayoutAccount) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn put_intent(&self, intent: PaymentIntent) {
        self.intents.insert(intent.id.clone(), intent);
    }

    pub fn created_intents(&self) -> Vec<CreateIntentParams> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn retrieve_account(&self, account_id: &str) -> Result<PayoutAccount, ProcessorError> {
        self.accounts
            .get(account_id)
            .map(|a| a.value().clone())
            .ok_or(ProcessorError::ApiError {
                status_code: 404,
                message: format!("No such account: {account_id}"),
            })
    }

    async fn create_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, ProcessorError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_mock_{n}");

        let intent = PaymentIntent {
            id: id.clone(),
            amount: params.amount_minor,
            currency: params.currency.clone(),
            status: "requires_payment_method".to_string(),
            client_secret: Some(format!("{id}_secret_{n}")),
            metadata: intent_metadata(params.payer_id, params.client_id, Some(params.payee_id)),
            created: Some(Utc::now().timestamp()),
        };

        self.created.lock().unwrap().push(params.clone());
        self.put_intent(intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        self.intents
            .get(intent_id)
            .map(|i| i.value().clone())
            .ok_or(ProcessorError::ApiError {
                status_code: 404,
                message: format!("No such payment_intent: {intent_id}"),
            })
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        _refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, ProcessorError> {
        Ok(AccountLink {
            url: format!("https://connect.example.test/setup/{account_id}?return={return_url}"),
            expires_at: Some(Utc::now().timestamp() + 300),
        })
    }

    fn verify_webhook_signature(
        &self,
        raw_body: &[u8],
        signature_header: &str,
    ) -> Result<(), ProcessorError> {
        verify_webhook_signature(raw_body, signature_header, WEBHOOK_SECRET, Some(300))
    }
}

/// Ledger whose database is unreachable
pub struct UnavailableLedger;

impl UnavailableLedger {
    fn down() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl PaymentLedger for UnavailableLedger {
    async fn find_by_external_reference(
        &self,
        _external_reference: &str,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Err(Self::down())
    }

    async fn record_outcome(&self, _record: NewPaymentRecord) -> Result<LedgerWrite, StoreError> {
        Err(Self::down())
    }

    async fn apply_status(
        &self,
        _external_reference: &str,
        _status: PaymentStatus,
    ) -> Result<Option<LedgerWrite>, StoreError> {
        Err(Self::down())
    }

    async fn list_by_owner(&self, _owner_user_id: Uuid) -> Result<Vec<PaymentRecord>, StoreError> {
        Err(Self::down())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(Self::down())
    }
}

pub fn intent_metadata(payer_id: Uuid, client_id: Uuid, payee_id: Option<Uuid>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(PAYER_ID_KEY.to_string(), payer_id.to_string());
    metadata.insert(CLIENT_ID_KEY.to_string(), client_id.to_string());
    if let Some(payee_id) = payee_id {
        metadata.insert(PAYEE_ID_KEY.to_string(), payee_id.to_string());
    }
    metadata
}

pub fn ready_account(id: &str) -> PayoutAccount {
    PayoutAccount {
        id: id.to_string(),
        charges_enabled: true,
        payouts_enabled: true,
        details_submitted: true,
    }
}

/// A tenant linked to a client owned by a property manager
#[derive(Debug, Clone, Copy)]
pub struct Tenancy {
    pub tenant_id: Uuid,
    pub manager_id: Uuid,
    pub client_id: Uuid,
}

pub struct TestApp {
    pub router: Router,
    pub ledger: MemoryLedger,
    pub directory: MemoryDirectory,
    pub processor: Arc<MockProcessor>,
    pub state: AppState,
    jwt: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(PaymentSettings::default())
    }

    pub fn with_settings(settings: PaymentSettings) -> Self {
        let ledger = MemoryLedger::new();
        Self::build(settings, Arc::new(ledger.clone()), ledger)
    }

    /// App whose ledger fails every call; `self.ledger` stays empty.
    pub fn with_broken_ledger() -> Self {
        Self::build(
            PaymentSettings::default(),
            Arc::new(UnavailableLedger),
            MemoryLedger::new(),
        )
    }

    fn build(
        settings: PaymentSettings,
        backend: Arc<dyn PaymentLedger>,
        ledger: MemoryLedger,
    ) -> Self {
        let directory = MemoryDirectory::new();
        let processor = Arc::new(MockProcessor::default());

        let state = AppState::new(
            backend,
            Arc::new(directory.clone()),
            processor.clone(),
            settings,
            JwtKeys::from_secret(JWT_SECRET),
        )
        .unwrap();

        Self {
            router: payments_router(state.clone()),
            ledger,
            directory,
            processor,
            state,
            jwt: JwtKeys::from_secret(JWT_SECRET),
        }
    }

    /// Seed a tenant, their client record and the manager's payout account.
    pub fn seed_tenancy(&self, rent: Option<Decimal>, account: Option<PayoutAccount>) -> Tenancy {
        let tenancy = Tenancy {
            tenant_id: Uuid::new_v4(),
            manager_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
        };

        self.directory.upsert_client(TenantClient {
            id: tenancy.client_id,
            owner_user_id: tenancy.manager_id,
            linked_user_id: Some(tenancy.tenant_id),
            name: "Unit 4B".to_string(),
            rent_amount: rent,
        });
        self.directory.upsert_payee(Payee {
            user_id: tenancy.manager_id,
            payout_account_id: account.as_ref().map(|a| a.id.clone()),
        });
        if let Some(account) = account {
            self.processor.add_account(account);
        }

        tenancy
    }

    /// Intent the tenant has already paid at the processor
    pub fn paid_intent(&self, id: &str, tenancy: &Tenancy, amount_minor: i64) -> PaymentIntent {
        let intent = PaymentIntent {
            id: id.to_string(),
            amount: amount_minor,
            currency: "usd".to_string(),
            status: "succeeded".to_string(),
            client_secret: None,
            metadata: intent_metadata(
                tenancy.tenant_id,
                tenancy.client_id,
                Some(tenancy.manager_id),
            ),
            created: Some(Utc::now().timestamp()),
        };
        self.processor.put_intent(intent.clone());
        intent
    }

    pub fn bearer(&self, user_id: Uuid, role: Role) -> String {
        let token = self.jwt.sign_access_token(user_id, role, 15).unwrap();
        format!("Bearer {token}")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_webhook(&self, event: &Value) -> Response<Body> {
        self.send(signed_webhook(event)).await
    }
}

pub fn signed_webhook(event: &Value) -> Request<Body> {
    let body = serde_json::to_vec(event).unwrap();
    let signature = sign_payload(&body, Utc::now().timestamp(), WEBHOOK_SECRET).unwrap();

    Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

pub fn intent_event(event_type: &str, intent: &PaymentIntent) -> Value {
    json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": { "object": intent }
    })
}

pub fn charge_event(event_type: &str, object_id: &str, payment_intent: &str) -> Value {
    json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": { "object": { "id": object_id, "payment_intent": payment_intent } }
    })
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

/// Read response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
