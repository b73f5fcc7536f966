mod common;

use auth_kit::Role;
use axum::http::StatusCode;
use common::*;
use http_body_util::BodyExt;
use rent_payments_rs::processor::PayoutAccount;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn managers_see_only_their_own_payments() {
    let app = TestApp::new();
    let mine = app.seed_tenancy(Some(Decimal::new(120000, 2)), Some(ready_account("acct_1")));
    let theirs = app.seed_tenancy(Some(Decimal::new(90000, 2)), Some(ready_account("acct_2")));

    let a = app.paid_intent("pi_mine", &mine, 120000);
    let b = app.paid_intent("pi_theirs", &theirs, 90000);
    app.post_webhook(&intent_event("payment_intent.succeeded", &a))
        .await;
    app.post_webhook(&intent_event("payment_intent.succeeded", &b))
        .await;

    let auth = app.bearer(mine.manager_id, Role::Manager);
    let response = app.send(get_request("/api/payments", Some(&auth))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["externalReference"], "pi_mine");
    assert_eq!(records[0]["status"], "succeeded");
    assert_eq!(records[0]["amount"], "1200.00");
}

#[tokio::test]
async fn tenants_cannot_list_payments() {
    let app = TestApp::new();
    let auth = app.bearer(Uuid::new_v4(), Role::Tenant);

    let response = app.send(get_request("/api/payments", Some(&auth))).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn payout_account_status_reports_capabilities() {
    let app = TestApp::new();
    let tenancy = app.seed_tenancy(
        Some(Decimal::new(100000, 2)),
        Some(PayoutAccount {
            id: "acct_new".to_string(),
            charges_enabled: true,
            payouts_enabled: false,
            details_submitted: false,
        }),
    );
    let auth = app.bearer(tenancy.manager_id, Role::Manager);

    let response = app
        .send(get_request("/api/payments/payout-account", Some(&auth)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "accountId": "acct_new",
            "chargesEnabled": true,
            "payoutsEnabled": false,
            "detailsSubmitted": false,
            "ready": false
        })
    );
}

#[tokio::test]
async fn onboarding_link_returns_to_the_web_app() {
    let app = TestApp::new();
    let tenancy = app.seed_tenancy(Some(Decimal::new(100000, 2)), Some(ready_account("acct_pm")));
    let auth = app.bearer(tenancy.manager_id, Role::Manager);

    let response = app
        .send(json_request(
            "POST",
            "/api/payments/payout-account/links",
            Some(&auth),
            json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.contains("acct_pm"));
    assert!(url.contains("http://localhost:3000/settings/payments"));
    assert!(body["expiresAt"].is_i64());
}

#[tokio::test]
async fn onboarding_link_needs_a_payout_account() {
    let app = TestApp::new();
    let tenancy = app.seed_tenancy(Some(Decimal::new(100000, 2)), None);
    let auth = app.bearer(tenancy.manager_id, Role::Manager);

    let response = app
        .send(json_request(
            "POST",
            "/api/payments/payout-account/links",
            Some(&auth),
            json!({}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "payout_not_configured");
}

#[tokio::test]
async fn health_endpoints_report_ready() {
    let app = TestApp::new();

    let live = app.send(get_request("/api/health/live", None)).await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = app.send(get_request("/api/health/ready", None)).await;
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(body_json(ready).await["status"], "ready");
}

#[tokio::test]
async fn metrics_expose_webhook_outcomes() {
    let app = TestApp::new();
    app.post_webhook(&charge_event("charge.refunded", "ch_1", "pi_nowhere"))
        .await;

    let response = app.send(get_request("/metrics", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("payments_webhook_events_total"));
    assert!(text.contains(r#"outcome="skipped""#));
    assert!(text.contains("http_request_duration_seconds"));
}

#[tokio::test]
async fn responses_echo_the_trace_id() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .uri("/api/health/live")
        .header("x-trace-id", "trace-abc")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
}
