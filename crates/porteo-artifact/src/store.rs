//! # Versioned Artifact Store
//!
//! Append-only history of rendered representations per document. Each append
//! under a `(document, kind)` key gets the next version number; nothing is
//! ever overwritten, so a document regenerated after an edit keeps its
//! earlier renderings retrievable for audit and dispute resolution.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use porteo_core::{ArtifactId, DocumentId, Timestamp};

/// The kind of rendered representation stored for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationKind {
    /// The canonical byte representation submitted to the authority.
    Canonical,
    /// A rendered PDF for display and download.
    Pdf,
}

impl RepresentationKind {
    /// String form used in storage keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable stored version of a representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Identity of this stored version.
    pub id: ArtifactId,
    /// The document this version belongs to.
    pub document: DocumentId,
    /// Representation kind.
    pub kind: RepresentationKind,
    /// Version number, 1-based and monotonically increasing per
    /// `(document, kind)`.
    pub version: u32,
    /// The rendered bytes.
    pub bytes: Vec<u8>,
    /// When this version was stored.
    pub stored_at: Timestamp,
}

/// In-memory versioned artifact store.
///
/// Only the latest version per kind is submittable; historical versions stay
/// readable by version number. Appends for different documents are
/// independent; appends for the same key serialize on the map entry.
#[derive(Default)]
pub struct ArtifactStore {
    entries: DashMap<(DocumentId, RepresentationKind), Vec<StoredArtifact>>,
}

impl ArtifactStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new version and return it.
    pub fn append(
        &self,
        document: DocumentId,
        kind: RepresentationKind,
        bytes: Vec<u8>,
    ) -> StoredArtifact {
        let mut entry = self.entries.entry((document, kind)).or_default();
        let version = entry.len() as u32 + 1;
        let stored = StoredArtifact {
            id: ArtifactId::new(),
            document,
            kind,
            version,
            bytes,
            stored_at: Timestamp::now(),
        };
        entry.push(stored.clone());
        tracing::debug!(document = %document, kind = %kind, version, "artifact version stored");
        stored
    }

    /// The latest version for a `(document, kind)`, if any exists.
    pub fn latest(&self, document: DocumentId, kind: RepresentationKind) -> Option<StoredArtifact> {
        self.entries
            .get(&(document, kind))
            .and_then(|v| v.last().cloned())
    }

    /// A specific historical version (1-based).
    pub fn version(
        &self,
        document: DocumentId,
        kind: RepresentationKind,
        version: u32,
    ) -> Option<StoredArtifact> {
        self.entries
            .get(&(document, kind))
            .and_then(|v| v.get(version.checked_sub(1)? as usize).cloned())
    }

    /// Number of stored versions for a `(document, kind)`.
    pub fn version_count(&self, document: DocumentId, kind: RepresentationKind) -> u32 {
        self.entries
            .get(&(document, kind))
            .map(|v| v.len() as u32)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_monotonic_and_immutable() {
        let store = ArtifactStore::new();
        let doc = DocumentId::new();

        let v1 = store.append(doc, RepresentationKind::Canonical, b"uno".to_vec());
        let v2 = store.append(doc, RepresentationKind::Canonical, b"dos".to_vec());
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);

        // Latest is v2; v1 stays retrievable unchanged.
        let latest = store.latest(doc, RepresentationKind::Canonical).unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.bytes, b"dos");
        let old = store.version(doc, RepresentationKind::Canonical, 1).unwrap();
        assert_eq!(old.bytes, b"uno");
    }

    #[test]
    fn kinds_version_independently() {
        let store = ArtifactStore::new();
        let doc = DocumentId::new();
        store.append(doc, RepresentationKind::Canonical, b"c1".to_vec());
        let pdf = store.append(doc, RepresentationKind::Pdf, b"%PDF".to_vec());
        assert_eq!(pdf.version, 1);
        assert_eq!(store.version_count(doc, RepresentationKind::Canonical), 1);
        assert_eq!(store.version_count(doc, RepresentationKind::Pdf), 1);
    }

    #[test]
    fn missing_document_has_no_versions() {
        let store = ArtifactStore::new();
        let doc = DocumentId::new();
        assert!(store.latest(doc, RepresentationKind::Canonical).is_none());
        assert_eq!(store.version_count(doc, RepresentationKind::Canonical), 0);
        assert!(store.version(doc, RepresentationKind::Canonical, 0).is_none());
    }
}
