//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers in the Porteo stack. Each
//! identifier is a distinct type: a [`DocumentId`] cannot be passed where an
//! [`AccountId`] is expected.
//!
//! ## Validation
//!
//! [`Rfc`] (the SAT taxpayer identifier) validates its format at construction
//! and at deserialization. UUID-backed identifiers are always valid by
//! construction.
//!
//! Note that [`crate::domain::DocumentDraft`] stores issuer/recipient/actor
//! identifiers as plain strings: drafts are editable and may hold malformed
//! values, and the validation engine must be able to *report* a bad RFC as a
//! finding rather than fail at deserialization. `Rfc` is for contexts where
//! validity is already established (certification records, ledger references)
//! and as the single implementation of the format check itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Deserialize a validating string newtype through its `new()` constructor,
/// so invalid values are rejected at the deserialization boundary.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Implement the shared surface of a UUID-backed identifier.
macro_rules! impl_uuid_id {
    ($ty:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty(Uuid);

        impl $ty {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

impl_uuid_id!(
    DocumentId,
    "Unique identifier of a transport document across its whole lifecycle."
);
impl_uuid_id!(
    AccountId,
    "Unique identifier of a customer account owning documents and credit."
);
impl_uuid_id!(
    ArtifactId,
    "Unique identifier of one stored canonical-artifact version."
);

// ─── RFC (SAT taxpayer identifier) ───────────────────────────────────

/// A SAT RFC: 12 characters for personas morales, 13 for personas físicas.
///
/// Format: 3 or 4 leading letters (`A-Z`, `Ñ`, `&`), six digits (date of
/// incorporation or birth, `YYMMDD`), and a 3-character alphanumeric
/// homoclave. Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Rfc(String);

impl Rfc {
    /// Validate and construct an RFC, uppercasing the input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] when the length or character
    /// pattern does not match the SAT format.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let value = raw.into().trim().to_uppercase();
        Self::check(&value).map_err(|reason| CoreError::InvalidFormat {
            field: "rfc",
            reason,
        })?;
        Ok(Self(value))
    }

    /// Whether a string is a well-formed RFC. Used by the validation engine
    /// to report findings on draft fields without constructing the newtype.
    pub fn is_valid(raw: &str) -> bool {
        Self::check(&raw.trim().to_uppercase()).is_ok()
    }

    fn check(value: &str) -> Result<(), String> {
        let chars: Vec<char> = value.chars().collect();
        let n = chars.len();
        if n != 12 && n != 13 {
            return Err(format!("expected 12 or 13 characters, got {n}"));
        }
        let letters = n - 9;
        if !chars[..letters]
            .iter()
            .all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
        {
            return Err("leading block must be letters, Ñ, or &".into());
        }
        if !chars[letters..letters + 6].iter().all(|c| c.is_ascii_digit()) {
            return Err("date block must be six digits".into());
        }
        if !chars[letters + 6..]
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err("homoclave must be three alphanumeric characters".into());
        }
        Ok(())
    }

    /// Access the validated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this RFC belongs to a persona moral (12 characters).
    pub fn is_moral(&self) -> bool {
        self.0.chars().count() == 12
    }
}

impl_validating_deserialize!(Rfc);

impl std::fmt::Display for Rfc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Rfc {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moral_rfc_accepted() {
        let rfc = Rfc::new("AAA010101AAA").unwrap();
        assert!(rfc.is_moral());
    }

    #[test]
    fn fisica_rfc_accepted() {
        let rfc = Rfc::new("XAXX010101000").unwrap();
        assert!(!rfc.is_moral());
    }

    #[test]
    fn lowercase_input_uppercased() {
        let rfc = Rfc::new("aaa010101aaa").unwrap();
        assert_eq!(rfc.as_str(), "AAA010101AAA");
    }

    #[test]
    fn enye_and_ampersand_accepted() {
        assert!(Rfc::new("ÑAA010101AAA").is_ok());
        assert!(Rfc::new("A&A010101AAA").is_ok());
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(Rfc::new("AAA01010").is_err());
        assert!(Rfc::new("AAAA010101AAAA").is_err());
    }

    #[test]
    fn digits_in_letter_block_rejected() {
        assert!(Rfc::new("1AA010101AAA").is_err());
    }

    #[test]
    fn letters_in_date_block_rejected() {
        assert!(Rfc::new("AAA01X101AAA").is_err());
    }

    #[test]
    fn is_valid_matches_constructor() {
        assert!(Rfc::is_valid("XAXX010101000"));
        assert!(!Rfc::is_valid("BADRFC"));
    }

    #[test]
    fn deserialize_rejects_invalid() {
        let ok: Result<Rfc, _> = serde_json::from_str("\"AAA010101AAA\"");
        assert!(ok.is_ok());
        let bad: Result<Rfc, _> = serde_json::from_str("\"NOPE\"");
        assert!(bad.is_err());
    }

    #[test]
    fn document_ids_are_distinct() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }
}
