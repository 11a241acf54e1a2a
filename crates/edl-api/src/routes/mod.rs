//! # API Route Modules
//!
//! - `certificates`: issuance, lookup, hash verification, revocation,
//!   per-subject listing, and history of certificates.
//! - `consents`: grant, checked access, scoped disclosure, revocation,
//!   listings, status query, and history of consents.

pub mod certificates;
pub mod consents;

use serde::Deserialize;

use crate::extractors::Validate;

/// Request body carrying a revocation reason.
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub reason: String,
}

impl Validate for RevokeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        Ok(())
    }
}
