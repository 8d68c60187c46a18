//! Contract tests for `HttpPacAdapter` against a mocked provider API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use porteo_core::{ContentDigest, DocumentId};
use porteo_pac::{
    CancelOutcome, CancelRequest, HttpPacAdapter, PacAdapter, PacConfig, PacError,
    RejectionCategory, StampOutcome, StampRequest,
};

fn adapter_for(server: &MockServer) -> HttpPacAdapter {
    let config = PacConfig::local_mock(&server.uri(), "test-token").unwrap();
    HttpPacAdapter::new(config).unwrap()
}

fn sample_request() -> StampRequest {
    StampRequest {
        document: DocumentId::new(),
        content_digest: ContentDigest([7u8; 32]),
        canonical_payload: json!({"comprobante": {"tipo_comprobante": "T"}}),
    }
}

#[tokio::test]
async fn successful_stamp_returns_certification_record() {
    let server = MockServer::start().await;
    let uuid = uuid::Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/stamps"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({"environment": "test"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uuid": uuid,
            "seal": "c2VsbG8=",
            "cadena_original": "||1.1|...||",
            "qr_payload": "https://verificacfdi.example/q",
            "stamped_at": "2026-04-01T10:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    match adapter.stamp(&sample_request()).await.unwrap() {
        StampOutcome::Stamped(record) => {
            assert_eq!(record.uuid_fiscal, uuid);
            assert_eq!(record.seal, "c2VsbG8=");
        }
        other => panic!("expected Stamped, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_422_is_a_verdict_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stamps"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": "CP113",
            "description": "El atributo PesoBrutoTotal no coincide",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    match adapter.stamp(&sample_request()).await.unwrap() {
        StampOutcome::Rejected(rejection) => {
            assert_eq!(rejection.code, "CP113");
            assert_eq!(rejection.category, RejectionCategory::FieldValidation);
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_surfaces_as_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stamps"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    match adapter.stamp(&sample_request()).await {
        Err(PacError::UnexpectedStatus { status, body, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stamps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    assert!(matches!(
        adapter.stamp(&sample_request()).await,
        Err(PacError::Deserialization { .. })
    ));
}

#[tokio::test]
async fn cancel_accepted_round_trip() {
    let server = MockServer::start().await;
    let uuid = uuid::Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path(format!("/stamps/{uuid}/cancel")))
        .and(body_partial_json(json!({"reason_code": "02"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cancelled_at": "2026-04-02T09:30:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let outcome = adapter
        .cancel(&CancelRequest {
            uuid_fiscal: uuid,
            reason_code: "02".to_string(),
            replacement: None,
        })
        .await
        .unwrap();

    assert!(matches!(outcome, CancelOutcome::Accepted { .. }));
}

#[tokio::test]
async fn cancel_refusal_carries_authority_code() {
    let server = MockServer::start().await;
    let uuid = uuid::Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path(format!("/stamps/{uuid}/cancel")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "205",
            "description": "UUID no encontrado",
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    match adapter
        .cancel(&CancelRequest {
            uuid_fiscal: uuid,
            reason_code: "03".to_string(),
            replacement: None,
        })
        .await
        .unwrap()
    {
        CancelOutcome::Refused { code, .. } => assert_eq!(code, "205"),
        other => panic!("expected Refused, got {other:?}"),
    }
}
