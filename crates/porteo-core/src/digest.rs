//! # Content Digest — SHA-256 over Canonical Bytes
//!
//! `ContentDigest` identifies draft and artifact content. It can only be
//! computed from [`CanonicalBytes`], so every digest in the system is
//! guaranteed to come from the single canonicalization pipeline. The
//! validation cache, the stale-validation guard in the serializer, and the
//! artifact content identity all key on this type.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 content digest.
///
/// Displays as `sha256:<hex>`. Equality is byte equality; two drafts with the
/// same digest are the same content for caching and duplicate-detection
/// purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Render the digest as a lowercase hex string (no prefix).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical bytes.
///
/// The signature is the enforcement point: there is no way to digest a value
/// without first producing `CanonicalBytes` for it.
pub fn sha256_digest(bytes: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_bytes());
    let out = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&out);
    ContentDigest(digest)
}
