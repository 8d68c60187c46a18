//! # Error Types — Core Failures
//!
//! Errors owned by the foundational types. Pipeline-stage errors (validation
//! findings, ledger failures, authority rejections) live in their own crates;
//! this module only covers canonicalization, parsing, and identifier format
//! failures.

use thiserror::Error;

/// Errors from the foundational types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A value failed format validation at construction.
    #[error("invalid {field}: {reason}")]
    InvalidFormat {
        /// Which field or type rejected the value.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Timestamp parsing or normalization failed.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Quantities, weights, and amounts are integers in their smallest unit.
    #[error("float values are not permitted in canonical representations; use integer units: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
