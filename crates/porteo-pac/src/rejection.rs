//! Provider rejection-code taxonomy.
//!
//! The tax authority's validation service answers with three-digit numeric
//! codes: the 30x family covers envelope and certificate problems, the 40x
//! family covers content validation, and complement-level findings come
//! back as `CP`-prefixed codes. Provider-side operational codes use the
//! 6xx range. Classification drives what the caller does next: surface a
//! form error, fix credentials, buy credit, or try again later.

use serde::{Deserialize, Serialize};

/// What kind of problem a rejection code describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    /// Document content failed authority validation. The draft must change.
    FieldValidation,
    /// Signing certificate or issuer registration problem. The document is
    /// fine; the account's fiscal credentials are not.
    Credential,
    /// Provider-side stamping quota exhausted.
    Quota,
    /// An identical document was already stamped. Benign under retry:
    /// deterministic generation makes resubmitted bytes identical.
    Duplicate,
    /// Provider internal failure unrelated to the document.
    ProviderInternal,
}

/// Whether resubmitting the same bytes can ever succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionSeverity {
    /// Resubmission of the same document cannot succeed. Something outside
    /// the request must change first.
    Fatal,
    /// Transient provider condition. Resubmission later may succeed.
    Retryable,
}

/// Classify a provider rejection code.
///
/// Unknown codes default to `(ProviderInternal, Retryable)`: misclassifying
/// a new transient code as fatal strands a valid document, while the
/// reverse only costs a wasted resubmission.
pub fn classify_rejection(code: &str) -> (RejectionCategory, RejectionSeverity) {
    use RejectionCategory::*;
    use RejectionSeverity::*;

    match code {
        // Duplicate stamp: the document already carries a fiscal UUID.
        "307" => (Duplicate, Fatal),
        // Malformed envelope.
        "301" => (FieldValidation, Fatal),
        // Certificate and seal family.
        "302" | "303" | "304" | "305" | "306" | "308" => (Credential, Fatal),
        // Provider quota exhausted for the account.
        "601" => (Quota, Fatal),
        _ if code.starts_with("CP") => (FieldValidation, Fatal),
        _ if code.len() == 3 && code.starts_with('4') => (FieldValidation, Fatal),
        _ if code.len() == 3 && code.starts_with('6') => (ProviderInternal, Retryable),
        _ => (ProviderInternal, Retryable),
    }
}
