//! # Contract Configuration

use serde::{Deserialize, Serialize};

/// Organization whose members may issue and revoke certificates by default.
pub const DEFAULT_ISSUER_ORG: &str = "Org1MSP";

/// Upper bound on consent lifetimes by default (ten years).
pub const DEFAULT_MAX_CONSENT_DAYS: i64 = 3650;

/// Deployment-time policy for the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Membership organization allowed to issue and revoke certificates.
    pub issuer_org: String,
    /// When set, granting and revoking consent require the caller principal
    /// to be the consent's subject.
    pub enforce_subject_identity: bool,
    /// Longest consent a subject may grant, in days.
    pub max_consent_days: i64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            issuer_org: DEFAULT_ISSUER_ORG.to_string(),
            enforce_subject_identity: false,
            max_consent_days: DEFAULT_MAX_CONSENT_DAYS,
        }
    }
}
