//! # Certificate Endpoints
//!
//! - `POST /v1/certificates`: issue (issuer organization only).
//! - `GET /v1/certificates/{id}`: current state.
//! - `POST /v1/certificates/{id}/verify`: check a presented document hash.
//! - `POST /v1/certificates/{id}/revoke`: revoke (issuer of record only).
//! - `GET /v1/certificates/{id}/history`: every committed version.
//! - `GET /v1/subjects/{subject_id}/certificates`: certificates of a student.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use edl_contract::HistoryEntry;
use edl_core::{CertificateId, ContentHash, SubjectId};
use edl_state::{Certificate, CertificateIssuance};

use super::RevokeRequest;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Caller};
use crate::state::AppState;

/// Request body for hash verification.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub content_hash: ContentHash,
}

/// Successful verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub certificate_id: CertificateId,
    pub valid: bool,
}

/// Build the certificates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/certificates", post(issue_certificate))
        .route("/v1/certificates/{id}", get(read_certificate))
        .route("/v1/certificates/{id}/verify", post(verify_certificate))
        .route("/v1/certificates/{id}/revoke", post(revoke_certificate))
        .route("/v1/certificates/{id}/history", get(certificate_history))
        .route(
            "/v1/subjects/{subject_id}/certificates",
            get(certificates_by_subject),
        )
}

async fn issue_certificate(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CertificateIssuance>, JsonRejection>,
) -> Result<(StatusCode, Json<Certificate>), AppError> {
    let issuance = extract_json(body)?;
    let certificate = state.registry.issue_certificate(&caller, issuance)?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

async fn read_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, AppError> {
    let id = CertificateId::new(id)?;
    Ok(Json(state.registry.read_certificate(&id)?))
}

/// POST /v1/certificates/{id}/verify
///
/// 200 only for a matching hash on a VALID certificate. A revoked
/// certificate answers 409 `REVOKED`; a wrong hash answers 422
/// `HASH_MISMATCH`.
async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let id = CertificateId::new(id)?;
    let req = extract_json(body)?;
    let valid = state.registry.verify_certificate(&id, &req.content_hash)?;
    Ok(Json(VerifyResponse {
        certificate_id: id,
        valid,
    }))
}

async fn revoke_certificate(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<Certificate>, AppError> {
    let id = CertificateId::new(id)?;
    let req = extract_validated_json(body)?;
    Ok(Json(state.registry.revoke_certificate(&caller, &id, &req.reason)?))
}

async fn certificate_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry<Certificate>>>, AppError> {
    let id = CertificateId::new(id)?;
    Ok(Json(state.registry.certificate_history(&id)?))
}

async fn certificates_by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<Certificate>>, AppError> {
    let subject = SubjectId::new(subject_id)?;
    Ok(Json(state.registry.certificates_by_subject(&subject)?))
}
