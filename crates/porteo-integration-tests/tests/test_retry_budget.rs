//! Authority-connectivity failures: the adapter owns the bounded transport
//! retry budget, and the ledger is never charged twice for one submission.

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use porteo_integration_tests::{clean_draft, fund, harness_with_adapter};
use porteo_ledger::TransactionKind;
use porteo_lifecycle::{categorize, DocumentState, DocumentStore, ErrorKind, PipelineError};
use porteo_pac::{HttpPacAdapter, PacConfig, PacError};

#[tokio::test]
async fn transport_failure_exhausts_retries_with_a_single_debit() {
    // A connection-refused endpoint: every attempt is a transport error.
    let config = PacConfig::local_mock("http://127.0.0.1:1", "test-token").unwrap();
    let adapter = Arc::new(HttpPacAdapter::new(config).unwrap());
    let (ledger, documents, pipeline) = harness_with_adapter(adapter);

    let draft = clean_draft();
    let account = draft.account;
    let id = draft.id;
    fund(&ledger, account, 3);
    pipeline.create_draft(draft).unwrap();

    let err = match pipeline.certify(id).await {
        Err(err @ PipelineError::Authority(PacError::Http { .. })) => err,
        other => panic!("expected transport failure, got {other:?}"),
    };

    // Retryable connectivity error, document parked at Generated.
    assert_eq!(categorize(&err).kind, ErrorKind::Connectivity);
    assert_eq!(documents.load(id).unwrap().state, DocumentState::Generated);

    // The submission attempt debited the ledger exactly once.
    let consumes = ledger
        .transactions_for(account)
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Consume)
        .count();
    assert_eq!(consumes, 1);

    // A later retry of the same bytes does not debit again.
    let _ = pipeline.certify(id).await;
    let consumes = ledger
        .transactions_for(account)
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Consume)
        .count();
    assert_eq!(consumes, 1);
}

#[tokio::test]
async fn http_error_responses_are_not_retried() {
    // 503 is a response, not a transport failure: exactly one request.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stamps"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let config = PacConfig::local_mock(&server.uri(), "test-token").unwrap();
    let adapter = Arc::new(HttpPacAdapter::new(config).unwrap());
    let (ledger, _documents, pipeline) = harness_with_adapter(adapter);

    let draft = clean_draft();
    let account = draft.account;
    let id = draft.id;
    fund(&ledger, account, 3);
    pipeline.create_draft(draft).unwrap();

    match pipeline.certify(id).await {
        Err(PipelineError::Authority(PacError::UnexpectedStatus { status, .. })) => {
            assert_eq!(status, 503)
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
    // Mock expectation (exactly one request) is verified on drop.
}
