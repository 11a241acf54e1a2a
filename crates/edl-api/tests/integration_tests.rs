//! # Integration Tests for edl-api
//!
//! Drives the router end to end: certificate issuance, verification and
//! revocation; consent grant, access, disclosure and expiry; listings,
//! history, health probes, and metrics.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use edl_api::state::{AppConfig, AppState};
use edl_core::{ManualClock, Timestamp};

const ISSUER_ORG: &str = "Org1MSP";
const ISSUER: &str = "did:example:university";
const STUDENT: &str = "did:example:student";
const EMPLOYER: &str = "did:example:employer";
const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

/// Helper: build the test app over an empty ledger.
fn test_app() -> axum::Router {
    edl_api::app(AppState::default())
}

/// Helper: build the test app with a controllable clock.
fn test_app_with_clock() -> (axum::Router, Arc<ManualClock>, AppState) {
    let start = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let state = AppState::with_clock(AppConfig::default(), clock.clone());
    (edl_api::app(state.clone()), clock, state)
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: send a request and decode the JSON reply.
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    caller: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((org, principal)) = caller {
        builder = builder
            .header("x-caller-org", org)
            .header("x-caller-principal", principal);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let text = body_string(response).await;
    let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, value)
}

fn issuer() -> Option<(&'static str, &'static str)> {
    Some((ISSUER_ORG, ISSUER))
}

async fn issue(app: &axum::Router, id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/certificates",
        issuer(),
        Some(json!({
            "certificate_id": id,
            "content_hash": HASH,
            "issuer_id": ISSUER,
            "subject_id": STUDENT,
            "metadata": {"degree": "BSc Physics", "gpa": "3.9", "honors": "cum laude"}
        })),
    )
    .await
}

async fn grant(app: &axum::Router, consent_id: &str, certificate_id: &str, days: i64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/consents",
        Some(("StudentMSP", STUDENT)),
        Some(json!({
            "consent_id": consent_id,
            "subject_id": STUDENT,
            "verifier_id": EMPLOYER,
            "certificate_id": certificate_id,
            "purpose": "employment",
            "data_scope": ["degree"],
            "duration_days": days
        })),
    )
    .await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_follows_ledger_availability() {
    let state = AppState::default();
    let app = edl_api::app(state.clone());
    let (status, body) = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ready"));

    state.ledger().set_available(false);
    let (status, _) = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// -- Certificates -------------------------------------------------------------

#[tokio::test]
async fn test_issue_and_read_certificate() {
    let app = test_app();
    let (status, body) = issue(&app, "CERT-1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "VALID");
    assert_eq!(body["subject_id"], STUDENT);

    let (status, body) = send(&app, "GET", "/v1/certificates/CERT-1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certificate_id"], "CERT-1");
    assert_eq!(body["content_hash"], HASH);
}

#[tokio::test]
async fn test_issue_requires_issuer_org() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates",
        Some(("Org2MSP", ISSUER)),
        Some(json!({
            "certificate_id": "CERT-1",
            "content_hash": HASH,
            "issuer_id": ISSUER,
            "subject_id": STUDENT
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app, "GET", "/v1/certificates/CERT-1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_issue_conflicts() {
    let app = test_app();
    assert_eq!(issue(&app, "CERT-1").await.0, StatusCode::CREATED);
    let (status, body) = issue(&app, "CERT-1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_KEY");
}

#[tokio::test]
async fn test_issue_rejects_empty_identifier() {
    let app = test_app();
    let (status, body) = issue(&app, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_certificate_is_404() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/v1/certificates/NOPE", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_verify_revoke_lifecycle() {
    let app = test_app();
    issue(&app, "CERT-1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/verify",
        None,
        Some(json!({"content_hash": HASH})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"certificate_id": "CERT-1", "valid": true}));

    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/verify",
        None,
        Some(json!({"content_hash": "tampered"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "HASH_MISMATCH");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/revoke",
        issuer(),
        Some(json!({"reason": "academic misconduct"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "REVOKED");
    assert_eq!(body["revocation_reason"], "academic misconduct");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/verify",
        None,
        Some(json!({"content_hash": HASH})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "REVOKED");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/revoke",
        issuer(),
        Some(json!({"reason": "again"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_REVOKED");
}

#[tokio::test]
async fn test_revoke_requires_issuer_of_record() {
    let app = test_app();
    issue(&app, "CERT-1").await;
    let (status, _) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/revoke",
        Some((ISSUER_ORG, "did:example:other-registrar")),
        Some(json!({"reason": "fraud"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revoke_rejects_blank_reason() {
    let app = test_app();
    issue(&app, "CERT-1").await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/revoke",
        issuer(),
        Some(json!({"reason": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_certificates_by_subject_and_history() {
    let app = test_app();
    issue(&app, "CERT-2").await;
    issue(&app, "CERT-1").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/subjects/{STUDENT}/certificates"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["certificate_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["CERT-1", "CERT-2"]);

    send(
        &app,
        "POST",
        "/v1/certificates/CERT-1/revoke",
        issuer(),
        Some(json!({"reason": "error"})),
    )
    .await;
    let (status, body) = send(&app, "GET", "/v1/certificates/CERT-1/history", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["record"]["status"], "VALID");
    assert_eq!(history[1]["record"]["status"], "REVOKED");
    assert_ne!(history[0]["tx_id"], history[1]["tx_id"]);
}

// -- Consents -----------------------------------------------------------------

#[tokio::test]
async fn test_grant_access_and_disclose() {
    let app = test_app();
    issue(&app, "CERT-1").await;

    let (status, body) = grant(&app, "CONSENT-1", "CERT-1", 30).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["access_count"], 0);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/access",
        None,
        Some(json!({"verifier_id": EMPLOYER})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_count"], 1);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/disclose",
        None,
        Some(json!({"verifier_id": EMPLOYER})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certificate_id"], "CERT-1");
    assert_eq!(body["fields"], json!({"degree": "BSc Physics"}));

    let (_, body) = send(&app, "GET", "/v1/consents/CONSENT-1", None, None).await;
    assert_eq!(body["access_count"], 2);
}

#[tokio::test]
async fn test_access_is_keyed_on_body_verifier_not_headers() {
    let mut config = AppConfig::default();
    config.contract.enforce_subject_identity = true;
    let app = edl_api::app(AppState::new(config));
    issue(&app, "CERT-1").await;
    assert_eq!(grant(&app, "CONSENT-1", "CERT-1", 30).await.0, StatusCode::CREATED);

    // Membership headers naming someone else do not change who is checked.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/access",
        Some(("OtherMSP", "did:example:someone-else")),
        Some(json!({"verifier_id": EMPLOYER})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_count"], 1);

    // Headers naming the real verifier do not help a wrong body.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/disclose",
        Some(("EmployerMSP", EMPLOYER)),
        Some(json!({"verifier_id": "did:example:someone-else"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_access_by_other_verifier_is_forbidden() {
    let app = test_app();
    issue(&app, "CERT-1").await;
    grant(&app, "CONSENT-1", "CERT-1", 30).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/access",
        None,
        Some(json!({"verifier_id": "did:example:stranger"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "VERIFIER_MISMATCH");

    let (_, body) = send(&app, "GET", "/v1/consents/CONSENT-1", None, None).await;
    assert_eq!(body["access_count"], 0);
}

#[tokio::test]
async fn test_grant_validation() {
    let app = test_app();
    issue(&app, "CERT-1").await;

    let (status, body) = grant(&app, "CONSENT-1", "CERT-1", 0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "MALFORMED_INPUT");

    let (status, body) = grant(&app, "CONSENT-1", "CERT-404", 30).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    assert_eq!(grant(&app, "CONSENT-1", "CERT-1", 30).await.0, StatusCode::CREATED);
    let (status, body) = grant(&app, "CONSENT-1", "CERT-1", 30).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_KEY");
}

#[tokio::test]
async fn test_expired_consent_is_gone_then_marked() {
    let (app, clock, _) = test_app_with_clock();
    issue(&app, "CERT-1").await;
    grant(&app, "CONSENT-1", "CERT-1", 1).await;
    clock.advance_days(2);

    let access = json!({"verifier_id": EMPLOYER});
    let (status, body) = send(&app, "POST", "/v1/consents/CONSENT-1/access", None, Some(access.clone())).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"]["code"], "EXPIRED_CONSENT");

    let (_, body) = send(&app, "GET", "/v1/consents/CONSENT-1", None, None).await;
    assert_eq!(body["status"], "EXPIRED");

    let (status, body) = send(&app, "POST", "/v1/consents/CONSENT-1/access", None, Some(access)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_EXPIRED");
}

#[tokio::test]
async fn test_revoke_consent_blocks_access() {
    let app = test_app();
    issue(&app, "CERT-1").await;
    grant(&app, "CONSENT-1", "CERT-1", 30).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/revoke",
        Some(("StudentMSP", STUDENT)),
        Some(json!({"reason": "changed my mind"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "REVOKED");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/consents/CONSENT-1/access",
        None,
        Some(json!({"verifier_id": EMPLOYER})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "REVOKED_CONSENT");

    let (status, body) = send(&app, "GET", "/v1/consents/CONSENT-1/history", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_consent_listings() {
    let (app, clock, _) = test_app_with_clock();
    issue(&app, "CERT-1").await;
    grant(&app, "CONSENT-1", "CERT-1", 1).await;
    grant(&app, "CONSENT-2", "CERT-1", 30).await;
    clock.advance_days(2);

    let (status, body) = send(&app, "GET", &format!("/v1/subjects/{STUDENT}/consents"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", &format!("/v1/verifiers/{EMPLOYER}/consents"), None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/v1/verifiers/{EMPLOYER}/consents?active_only=true"),
        None,
        None,
    )
    .await;
    let active = body.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["consent_id"], "CONSENT-2");

    // Stored status: the lapsed consent has not been touched yet.
    let (status, body) = send(&app, "GET", "/v1/consents?status=ACTIVE", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/v1/consents?status=PAUSED", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// -- Failure Handling ---------------------------------------------------------

#[tokio::test]
async fn test_ledger_outage_is_503_without_details() {
    let state = AppState::default();
    let app = edl_api::app(state.clone());
    state.ledger().set_available(false);

    let (status, body) = issue(&app, "CERT-1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
    assert!(!body["error"]["message"].as_str().unwrap().contains("ledger error"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/certificates")
                .header("content-type", "application/json")
                .header("x-caller-org", ISSUER_ORG)
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Metrics ------------------------------------------------------------------

#[tokio::test]
async fn test_metrics_count_requests_and_errors() {
    let app = test_app();
    issue(&app, "CERT-1").await;
    send(&app, "GET", "/v1/certificates/NOPE", None, None).await;

    let (status, body) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("edl_http_requests_total 2\n"), "{text}");
    assert!(text.contains("edl_http_errors_total{class=\"client\"} 1\n"), "{text}");
}
