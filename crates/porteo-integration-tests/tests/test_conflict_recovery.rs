//! A competing writer landing between the credit debit and the write that
//! records it must not cause a second charge for the same canonical bytes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use porteo_core::DocumentId;
use porteo_integration_tests::{clean_draft, fund, harness_with_store};
use porteo_ledger::TransactionKind;
use porteo_lifecycle::{
    DocumentRecord, DocumentState, DocumentStore, InMemoryDocumentStore, LifecycleError,
};

/// Store that lets a competing writer bump the revision right before the
/// write recording the debit lands, exactly once, so that write conflicts
/// and the pipeline retries from a record with no payment bookkeeping.
struct ContendedStore {
    inner: InMemoryDocumentStore,
    clobbered: AtomicBool,
}

impl ContendedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            clobbered: AtomicBool::new(false),
        }
    }
}

impl DocumentStore for ContendedStore {
    fn insert(&self, record: DocumentRecord) -> Result<(), LifecycleError> {
        self.inner.insert(record)
    }

    fn load(&self, id: DocumentId) -> Result<DocumentRecord, LifecycleError> {
        self.inner.load(id)
    }

    fn save(&self, record: DocumentRecord) -> Result<DocumentRecord, LifecycleError> {
        let records_debit = record.paid_digest.is_some() && record.certification.is_none();
        if records_debit && !self.clobbered.swap(true, Ordering::SeqCst) {
            // The competing writer re-saves the current pre-debit record,
            // so the caller's write carries a stale revision.
            let current = self.inner.load(record.id)?;
            self.inner.save(current)?;
        }
        self.inner.save(record)
    }
}

#[tokio::test]
async fn conflict_after_debit_does_not_charge_twice() {
    let store = Arc::new(ContendedStore::new());
    let (ledger, _pac, pipeline) = harness_with_store(store);

    let draft = clean_draft();
    let account = draft.account;
    let id = draft.id;
    fund(&ledger, account, 5);
    pipeline.create_draft(draft).unwrap();

    // The conflict is retried transparently; the run still certifies.
    pipeline.certify(id).await.unwrap();
    assert_eq!(
        pipeline.store().load(id).unwrap().state,
        DocumentState::Certified
    );

    // One certification, one unit: the retried attempt re-consumes the
    // same content digest and the ledger recognizes it as already paid.
    assert_eq!(ledger.balance(account).unwrap().combined(), 4);
    let consumes = ledger
        .transactions_for(account)
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Consume)
        .count();
    assert_eq!(consumes, 1);
}
