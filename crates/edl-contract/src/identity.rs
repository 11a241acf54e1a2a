//! # Caller Identity
//!
//! The membership layer authenticates callers; the contract only asks who
//! they are. An [`IdentityProvider`] answers with the caller's organization
//! (membership service provider id) and principal (the DID or certificate
//! subject the caller acts as).

/// Who is invoking the current transaction.
pub trait IdentityProvider: Send + Sync {
    /// Membership organization of the caller.
    fn caller_org(&self) -> &str;

    /// The caller's own identity within that organization.
    fn caller_principal(&self) -> &str;
}

/// A caller identity asserted by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    org: String,
    principal: String,
}

impl CallerIdentity {
    /// Identity for `principal` in organization `org`.
    pub fn new(org: impl Into<String>, principal: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            principal: principal.into(),
        }
    }

    /// A caller with no organization or principal. Enough for reads.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for CallerIdentity {
    fn caller_org(&self) -> &str {
        &self.org
    }

    fn caller_principal(&self) -> &str {
        &self.principal
    }
}
