//! Cancellation: drafts are discarded locally, certified documents go
//! through the authority, everything else refuses.

use std::sync::Arc;

use porteo_integration_tests::{clean_draft, fund, harness, harness_with_pac};
use porteo_lifecycle::{CancelReason, DocumentState, DocumentStore, LifecycleError, PipelineError};
use porteo_pac::{CancelOutcome, MockPacAdapter};

#[tokio::test]
async fn draft_discard_has_no_side_effects() {
    let h = harness();
    let draft = clean_draft();
    let id = draft.id;
    fund(&h.ledger, draft.account, 1);
    h.pipeline.create_draft(draft).unwrap();

    let record = h
        .pipeline
        .cancel(id, CancelReason::NotCarriedOut)
        .await
        .unwrap();

    assert_eq!(record.state, DocumentState::Cancelled);
    assert!(record.cancellation.unwrap().cancelled_at.is_none());
    assert_eq!(h.pac.cancel_calls(), 0);
}

#[tokio::test]
async fn certified_document_cancels_through_the_authority() {
    let h = harness();
    let draft = clean_draft();
    let account = draft.account;
    let id = draft.id;
    fund(&h.ledger, account, 1);
    h.pipeline.create_draft(draft).unwrap();
    h.pipeline.certify(id).await.unwrap();

    let record = h
        .pipeline
        .cancel(
            id,
            CancelReason::ErrorsWithReissue {
                replacement: uuid::Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    assert_eq!(record.state, DocumentState::Cancelled);
    assert!(record.cancellation.unwrap().cancelled_at.is_some());
    assert_eq!(h.pac.cancel_calls(), 1);
}

#[tokio::test]
async fn refused_cancellation_keeps_the_document_certified() {
    let pac = Arc::new(MockPacAdapter::new());
    pac.script_cancel(Ok(CancelOutcome::Refused {
        code: "205".into(),
        description: "UUID no encontrado".into(),
    }));
    let h = harness_with_pac(pac);

    let draft = clean_draft();
    let id = draft.id;
    fund(&h.ledger, draft.account, 1);
    h.pipeline.create_draft(draft).unwrap();
    h.pipeline.certify(id).await.unwrap();

    match h.pipeline.cancel(id, CancelReason::ErrorsNoReissue).await {
        Err(PipelineError::CancelRefused { code, .. }) => assert_eq!(code, "205"),
        other => panic!("expected CancelRefused, got {other:?}"),
    }
    assert_eq!(
        h.documents.load(id).unwrap().state,
        DocumentState::Certified
    );
}

#[tokio::test]
async fn intermediate_states_cannot_cancel() {
    let h = harness();
    let draft = clean_draft();
    let id = draft.id;
    fund(&h.ledger, draft.account, 1);
    h.pipeline.create_draft(draft).unwrap();
    h.pipeline.generate(id).await.unwrap();

    match h.pipeline.cancel(id, CancelReason::ErrorsNoReissue).await {
        Err(PipelineError::Lifecycle(LifecycleError::InvalidTransition { from, .. })) => {
            assert_eq!(from, "GENERATED")
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}
