//! Document persistence with optimistic concurrency.
//!
//! Every write carries the revision the caller loaded; a mismatch means
//! another writer got there first and surfaces as
//! [`LifecycleError::Conflict`], which is safe to retry from the freshly
//! loaded state.

use dashmap::DashMap;

use porteo_core::DocumentId;

use crate::state::{DocumentRecord, LifecycleError};

/// Document persistence seam.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails if the identity already exists.
    fn insert(&self, record: DocumentRecord) -> Result<(), LifecycleError>;

    /// Load a document by identity.
    fn load(&self, id: DocumentId) -> Result<DocumentRecord, LifecycleError>;

    /// Write a document back. The record's `revision` must match the
    /// store's current revision; on success the stored (and returned)
    /// record carries `revision + 1`.
    fn save(&self, record: DocumentRecord) -> Result<DocumentRecord, LifecycleError>;
}

/// In-memory [`DocumentStore`] backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<DocumentId, DocumentRecord>,
}

impl InMemoryDocumentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, record: DocumentRecord) -> Result<(), LifecycleError> {
        match self.documents.entry(record.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(LifecycleError::AlreadyExists(record.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn load(&self, id: DocumentId) -> Result<DocumentRecord, LifecycleError> {
        self.documents
            .get(&id)
            .map(|r| r.clone())
            .ok_or(LifecycleError::NotFound(id))
    }

    fn save(&self, mut record: DocumentRecord) -> Result<DocumentRecord, LifecycleError> {
        let mut current = self
            .documents
            .get_mut(&record.id)
            .ok_or(LifecycleError::NotFound(record.id))?;

        if current.revision != record.revision {
            return Err(LifecycleError::Conflict {
                document: record.id,
                expected: record.revision,
                actual: current.revision,
            });
        }
        record.revision += 1;
        *current = record.clone();
        Ok(record)
    }
}
