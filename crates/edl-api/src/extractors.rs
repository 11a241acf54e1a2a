//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, a helper to extract
//! and validate JSON bodies in handlers, and the [`Caller`] extractor that
//! turns membership headers into a contract identity.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Json;

use edl_contract::CallerIdentity;

use crate::error::AppError;

/// Header carrying the caller's membership organization.
pub const CALLER_ORG_HEADER: &str = "x-caller-org";
/// Header carrying the caller's principal (DID or certificate subject).
pub const CALLER_PRINCIPAL_HEADER: &str = "x-caller-principal";

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// The identity asserted by the membership layer in front of this API.
///
/// Absent headers yield an anonymous caller; the contract then rejects any
/// operation that needs an identity.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let org = header_text(parts, CALLER_ORG_HEADER)?;
        let principal = header_text(parts, CALLER_PRINCIPAL_HEADER)?;
        Ok(Self(CallerIdentity::new(org, principal)))
    }
}

fn header_text(parts: &Parts, name: &str) -> Result<String, AppError> {
    match parts.headers.get(name) {
        None => Ok(String::new()),
        Some(value) => value
            .to_str()
            .map(|v| v.trim().to_string())
            .map_err(|_| AppError::BadRequest(format!("header {name} is not valid text"))),
    }
}
