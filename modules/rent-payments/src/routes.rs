use auth_kit::{AuthUser, Role};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::confirmation::confirm_payment;
use crate::error::PaymentError;
use crate::intents::issue_intent;
use crate::middleware::metrics::metrics_middleware;
use crate::middleware::rate_limit::LimitScope;
use crate::middleware::tracing::trace_id_middleware;
use crate::models::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreateIntentResponse, OnboardingLinkResponse,
    PaymentRecord, PayoutAccountStatus, WebhookAck,
};
use crate::processor::webhook::SIGNATURE_HEADER;
use crate::reconciler::reconcile_webhook;
use crate::state::AppState;

type ApiResult<T> = Result<T, Response>;

pub fn payments_router(state: AppState) -> Router {
    Router::new()
        .route("/api/payments", get(list_payments))
        .route("/api/payments/intents", post(create_intent))
        .route("/api/payments/confirmations", post(confirm))
        .route("/api/payments/webhook", post(receive_webhook))
        .route("/api/payments/payout-account", get(payout_account_status))
        .route(
            "/api/payments/payout-account/links",
            post(create_onboarding_link),
        )
        .route("/api/health/live", get(health_live))
        .route("/api/health/ready", get(health_ready))
        .route("/metrics", get(metrics))
        .layer(from_fn_with_state(state.clone(), metrics_middleware))
        .layer(from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn enforce_limit(state: &AppState, scope: LimitScope, user_id: Uuid) -> Result<(), PaymentError> {
    state
        .limiters
        .check(scope, user_id, state.settings.rate_limit_per_min)
        .map_err(|wait| {
            state
                .metrics
                .rate_limited_total
                .with_label_values(&[scope.as_str()])
                .inc();
            tracing::warn!(user_id = %user_id, scope = scope.as_str(), "rate limit exceeded");
            PaymentError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
}

/// POST /api/payments/intents
async fn create_intent(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CreateIntentResponse>> {
    let user = user.require(Role::Tenant).map_err(IntoResponse::into_response)?;
    enforce_limit(&state, LimitScope::IntentCreate, user.user_id)
        .map_err(IntoResponse::into_response)?;

    issue_intent(&state, user.user_id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// POST /api/payments/confirmations
async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<ConfirmPaymentRequest>, JsonRejection>,
) -> ApiResult<Json<ConfirmPaymentResponse>> {
    let user = user.require(Role::Tenant).map_err(IntoResponse::into_response)?;
    enforce_limit(&state, LimitScope::Confirmation, user.user_id)
        .map_err(IntoResponse::into_response)?;
    let Json(body) = body
        .map_err(|rejection| PaymentError::InvalidRequest(rejection.body_text()).into_response())?;

    confirm_payment(&state, user.user_id, &body.payment_intent_id)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(ConfirmPaymentResponse { success: true }))
}

/// POST /api/payments/webhook
///
/// Takes the body as raw bytes: the signature covers the exact payload.
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, PaymentError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    reconcile_webhook(&state, &body, signature).await?;

    Ok(Json(WebhookAck { received: true }))
}

/// GET /api/payments
async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<PaymentRecord>>> {
    let user = user.require(Role::Manager).map_err(IntoResponse::into_response)?;

    state
        .ledger
        .list_by_owner(user.user_id)
        .await
        .map(Json)
        .map_err(|e| PaymentError::from(e).into_response())
}

async fn manager_account_id(state: &AppState, manager_id: Uuid) -> Result<String, PaymentError> {
    let payee = state
        .directory
        .payee(manager_id)
        .await?
        .ok_or(PaymentError::PayeeNotFound)?;

    payee
        .payout_account_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(PaymentError::PayoutNotConfigured)
}

/// GET /api/payments/payout-account
async fn payout_account_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<PayoutAccountStatus>> {
    let user = user.require(Role::Manager).map_err(IntoResponse::into_response)?;

    let status = async {
        let account_id = manager_account_id(&state, user.user_id).await?;
        let account = state.processor.retrieve_account(&account_id).await?;
        Ok::<_, PaymentError>(PayoutAccountStatus {
            ready: account.is_ready(),
            account_id: account.id,
            charges_enabled: account.charges_enabled,
            payouts_enabled: account.payouts_enabled,
            details_submitted: account.details_submitted,
        })
    }
    .await
    .map_err(IntoResponse::into_response)?;

    Ok(Json(status))
}

/// POST /api/payments/payout-account/links
async fn create_onboarding_link(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<OnboardingLinkResponse>> {
    let user = user.require(Role::Manager).map_err(IntoResponse::into_response)?;

    let link = async {
        let account_id = manager_account_id(&state, user.user_id).await?;
        let base = &state.settings.public_base_url;
        let refresh_url = format!("{base}/settings/payments?onboarding=refresh");
        let return_url = format!("{base}/settings/payments?onboarding=complete");

        let link = state
            .processor
            .create_account_link(&account_id, &refresh_url, &return_url)
            .await?;
        tracing::info!(manager_id = %user.user_id, account_id = %account_id, "onboarding link issued");
        Ok::<_, PaymentError>(link)
    }
    .await
    .map_err(IntoResponse::into_response)?;

    Ok(Json(OnboardingLinkResponse {
        url: link.url,
        expires_at: link.expires_at,
    }))
}

async fn health_live() -> StatusCode {
    StatusCode::OK
}

async fn health_ready(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    state.ledger.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "readiness check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(json!({
        "status": "ready",
        "database": "connected"
    })))
}

async fn metrics(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    state
        .metrics
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}
