//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Contract errors map to HTTP status codes by their [`ErrorKind`]; the
//! JSON body carries the kind as its machine-readable code. Ledger failures
//! are logged and never described to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edl_contract::{ContractError, ErrorKind};
use edl_store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "HASH_MISMATCH").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or headers could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Server-side failure (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// A contract operation failed.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Contract(ContractError::StoreUnavailable(StoreError::Conflict { .. })) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            Self::Contract(err) => (contract_status(err.kind()), err.kind().as_str()),
        }
    }

    fn is_server_side(&self) -> bool {
        self.status_and_code().0.is_server_error()
    }
}

fn contract_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized | ErrorKind::OwnershipMismatch | ErrorKind::VerifierMismatch => {
            StatusCode::FORBIDDEN
        }
        ErrorKind::DuplicateKey
        | ErrorKind::AlreadyRevoked
        | ErrorKind::Revoked
        | ErrorKind::RevokedConsent
        | ErrorKind::AlreadyExpired => StatusCode::CONFLICT,
        ErrorKind::ExpiredConsent => StatusCode::GONE,
        ErrorKind::HashMismatch | ErrorKind::MalformedInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose server-side failure details to clients.
        let message = if self.is_server_side() {
            tracing::error!(error = %self, "request failed server-side");
            "The ledger could not complete the request".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert core validation errors to API errors.
impl From<edl_core::ValidationError> for AppError {
    fn from(err: edl_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
