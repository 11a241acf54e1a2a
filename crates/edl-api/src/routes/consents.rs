//! # Consent Endpoints
//!
//! - `POST /v1/consents`: grant.
//! - `GET /v1/consents?status=ACTIVE`: consents by stored status.
//! - `GET /v1/consents/{id}`: current state.
//! - `POST /v1/consents/{id}/access`: checked, counted access by a verifier.
//! - `POST /v1/consents/{id}/disclose`: access and return the scoped certificate.
//! - `POST /v1/consents/{id}/revoke`: withdraw.
//! - `GET /v1/consents/{id}/history`: every committed version.
//! - `GET /v1/subjects/{subject_id}/consents`: consents a student granted.
//! - `GET /v1/verifiers/{verifier_id}/consents?active_only=true`: consents
//!   held by a verifier.
//!
//! Access and disclosure identify the verifier by the `verifier_id` in the
//! request body, not by the membership headers. This service does not
//! authenticate verifiers: the gateway in front of it must ensure the body
//! names the verifier that actually made the call. The
//! `enforce_subject_identity` setting binds the caller principal to the
//! subject on grant and revoke only; it never applies to `/access` or
//! `/disclose`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use edl_contract::HistoryEntry;
use edl_core::{ConsentId, SubjectId, VerifierId};
use edl_state::{ConsentGrant, ConsentRecord, ConsentStatus, Disclosure};

use super::RevokeRequest;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Caller};
use crate::state::AppState;

/// Request body for access and disclosure.
#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub verifier_id: VerifierId,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifierQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Build the consents router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/consents", post(grant_consent).get(consents_by_status))
        .route("/v1/consents/{id}", get(read_consent))
        .route("/v1/consents/{id}/access", post(access_consent))
        .route("/v1/consents/{id}/disclose", post(disclose))
        .route("/v1/consents/{id}/revoke", post(revoke_consent))
        .route("/v1/consents/{id}/history", get(consent_history))
        .route("/v1/subjects/{subject_id}/consents", get(consents_by_subject))
        .route(
            "/v1/verifiers/{verifier_id}/consents",
            get(consents_by_verifier),
        )
}

async fn grant_consent(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<ConsentGrant>, JsonRejection>,
) -> Result<(StatusCode, Json<ConsentRecord>), AppError> {
    let grant = extract_json(body)?;
    let consent = state.registry.grant_consent(&caller, grant)?;
    Ok((StatusCode::CREATED, Json(consent)))
}

async fn read_consent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConsentRecord>, AppError> {
    let id = ConsentId::new(id)?;
    Ok(Json(state.registry.read_consent(&id)?))
}

/// POST /v1/consents/{id}/access
///
/// A lapsed consent answers 410 `EXPIRED_CONSENT` once, and is stored
/// EXPIRED from then on; later attempts answer 409 `ALREADY_EXPIRED`.
async fn access_consent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Json<ConsentRecord>, AppError> {
    let id = ConsentId::new(id)?;
    let req = extract_json(body)?;
    Ok(Json(state.registry.access_consent(&id, &req.verifier_id)?))
}

async fn disclose(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<AccessRequest>, JsonRejection>,
) -> Result<Json<Disclosure>, AppError> {
    let id = ConsentId::new(id)?;
    let req = extract_json(body)?;
    Ok(Json(state.registry.disclose(&id, &req.verifier_id)?))
}

async fn revoke_consent(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<ConsentRecord>, AppError> {
    let id = ConsentId::new(id)?;
    let req = extract_validated_json(body)?;
    Ok(Json(state.registry.revoke_consent(&caller, &id, &req.reason)?))
}

async fn consent_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry<ConsentRecord>>>, AppError> {
    let id = ConsentId::new(id)?;
    Ok(Json(state.registry.consent_history(&id)?))
}

async fn consents_by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<ConsentRecord>>, AppError> {
    let subject = SubjectId::new(subject_id)?;
    Ok(Json(state.registry.consents_by_subject(&subject)?))
}

async fn consents_by_verifier(
    State(state): State<AppState>,
    Path(verifier_id): Path<String>,
    Query(query): Query<VerifierQuery>,
) -> Result<Json<Vec<ConsentRecord>>, AppError> {
    let verifier = VerifierId::new(verifier_id)?;
    Ok(Json(
        state
            .registry
            .consents_by_verifier(&verifier, query.active_only)?,
    ))
}

async fn consents_by_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ConsentRecord>>, AppError> {
    let status: ConsentStatus = query.status.parse().map_err(AppError::Validation)?;
    Ok(Json(state.registry.consents_by_status(status)?))
}
