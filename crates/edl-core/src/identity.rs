//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier the registry handles. These prevent
//! accidental identifier confusion: you cannot pass a `VerifierId` where a
//! `SubjectId` is expected, which matters because the consent checks compare
//! exactly these two roles.
//!
//! ## Key Safety
//!
//! Identifiers become parts of composite index keys, which use `\0` as the
//! separator. Validated constructors reject control characters, so an
//! identifier can never split or forge an index key.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum byte length of any identifier.
pub const MAX_IDENTIFIER_LEN: usize = 256;

fn validate_identifier(kind: &'static str, raw: String) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    if raw.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::IdentifierTooLong {
            kind,
            len: raw.len(),
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if raw.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter { kind });
    }
    Ok(raw)
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl $name {
            /// Create a validated identifier.
            ///
            /// # Errors
            ///
            /// Rejects empty, oversized, or control-character-bearing input.
            pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
                validate_identifier($kind, raw.into()).map(Self)
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier, returning the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier!(
    /// Primary key of a certificate. Immutable once issued.
    CertificateId,
    "certificate id"
);

string_identifier!(
    /// Primary key of a consent grant.
    ConsentId,
    "consent id"
);

string_identifier!(
    /// The individual a credential describes (the student), usually a DID.
    SubjectId,
    "subject id"
);

string_identifier!(
    /// The authority that issued a credential (the institution).
    IssuerId,
    "issuer id"
);

string_identifier!(
    /// A third party granted scoped access to credential data (the employer).
    VerifierId,
    "verifier id"
);

impl SubjectId {
    /// Whether the given caller principal names this subject.
    pub fn is_principal(&self, principal: &str) -> bool {
        self.0 == principal
    }
}

impl IssuerId {
    /// Whether the given caller principal names this issuer.
    pub fn is_principal(&self, principal: &str) -> bool {
        self.0 == principal
    }
}
