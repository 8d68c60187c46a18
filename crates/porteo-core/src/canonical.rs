//! # Canonical Serialization — JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation and for the canonical artifact submitted to the
//! certification authority.
//!
//! ## Invariant
//!
//! The newtype has a private inner field. The only constructor is
//! [`CanonicalBytes::new()`], which applies the coercion pipeline (float
//! rejection, recursion into containers) before RFC 8785 (JCS) serialization.
//! Any function that needs canonical bytes must accept `&CanonicalBytes`, so
//! a second, divergent serialization path cannot exist in the workspace.
//!
//! ## Coercion rules
//!
//! 1. **Reject floats.** Weights, quantities, and amounts are integers in
//!    their smallest unit (kilograms, centavos, kilometres). Floats have
//!    non-deterministic JCS number edge cases and are refused outright.
//! 2. **Datetimes** are normalized upstream by [`crate::Timestamp`], which
//!    serializes as `YYYY-MM-DDTHH:MM:SSZ`.
//! 3. **Object keys** are already strings in `serde_json::Map`; values recurse.
//!
//! After coercion, `serde_jcs` produces sorted-key, compact-separator,
//! deterministic output. The authority's duplicate-submission detection keys
//! on exact content, so byte-level determinism is load-bearing here.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - The only constructor is [`CanonicalBytes::new()`].
/// - No float ever reaches the serializer.
/// - Output is RFC 8785: sorted keys, compact separators, UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a float, or [`CanonicalizationError::SerializationFailed`] if JCS
    /// serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        let s = serde_jcs::to_string(&coerced)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively apply the coercion rules to a JSON value tree.
fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            // A number that is neither i64 nor u64 is a true float.
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}
