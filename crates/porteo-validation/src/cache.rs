//! # Validation Result Cache
//!
//! Caches [`ValidationResult`]s by the draft's content digest. Any edit to a
//! draft changes its digest, so a hit is always a result for exactly the
//! bytes being validated; there is no invalidation protocol to get wrong.

use dashmap::DashMap;

use porteo_core::ContentDigest;

use crate::finding::ValidationResult;

/// Digest-keyed cache of validation results.
///
/// Concurrent validations of different drafts never contend beyond the map
/// shard; duplicate concurrent validations of the same draft both compute and
/// the second insert harmlessly overwrites an identical value.
#[derive(Default)]
pub struct ValidationCache {
    entries: DashMap<ContentDigest, ValidationResult>,
}

impl ValidationCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a result for a draft digest.
    pub fn get(&self, digest: &ContentDigest) -> Option<ValidationResult> {
        self.entries.get(digest).map(|r| r.clone())
    }

    /// Store a result under its own digest.
    pub fn insert(&self, result: ValidationResult) {
        self.entries.insert(result.digest, result);
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
