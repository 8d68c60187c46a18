//! Shared fixtures for the cross-crate integration tests.

use std::sync::Arc;

use porteo_artifact::{ArtifactStore, Generator};
use porteo_catalog::SnapshotCatalog;
use porteo_core::{
    AccountId, ActorRole, DocumentDraft, DocumentId, DocumentKind, GoodsItem, Location,
    LocationRole, Timestamp, TransportActor, TransportUnit,
};
use porteo_ledger::{Bucket, CreditLedger};
use porteo_lifecycle::{DocumentStore, InMemoryDocumentStore, Pipeline};
use porteo_pac::{MockPacAdapter, PacAdapter};
use porteo_validation::ValidationEngine;

/// A draft that passes every validation rule against the bundled catalog.
pub fn clean_draft() -> DocumentDraft {
    DocumentDraft {
        id: DocumentId::new(),
        account: AccountId::new(),
        issuer_rfc: "AAA010101AAA".into(),
        issuer_name: "Transportes Aguila SA de CV".into(),
        recipient_rfc: "XAXX010101000".into(),
        recipient_name: "Publico en General".into(),
        kind: DocumentKind::Traslado,
        international: false,
        locations: vec![
            Location {
                role: LocationRole::Origin,
                street: "Av. Vallarta 1234".into(),
                municipality: "Guadalajara".into(),
                state_code: "JAL".into(),
                country_code: "MEX".into(),
                postal_code: "44100".into(),
                scheduled_at: Timestamp::parse("2026-03-15T08:00:00Z").expect("fixture timestamp"),
                distance_km: 0,
            },
            Location {
                role: LocationRole::Destination,
                street: "Calle 5 de Febrero 99".into(),
                municipality: "Querétaro".into(),
                state_code: "QUE".into(),
                country_code: "MEX".into(),
                postal_code: "76000".into(),
                scheduled_at: Timestamp::parse("2026-03-15T16:00:00Z").expect("fixture timestamp"),
                distance_km: 350,
            },
        ],
        goods: vec![GoodsItem {
            description: "Cajas de cartón corrugado".into(),
            product_code: "24101500".into(),
            unit_code: "XBX".into(),
            quantity: 100,
            weight_kg: 500,
            declared_value_cents: 1_250_000,
            hazardous: false,
            hazmat_code: None,
            packaging_code: None,
            special_permit: None,
        }],
        transport_unit: TransportUnit {
            plate: "ABC1234".into(),
            vehicle_config_code: "C2".into(),
            model_year: 2021,
            gross_weight_kg: 2000,
            permit_type: "TPAF01".into(),
            permit_number: "123456".into(),
            insurance_carrier: "Seguros del Norte".into(),
            insurance_policy: "POL-998877".into(),
        },
        actors: vec![TransportActor {
            role: ActorRole::Operator,
            rfc: "XAXX010101000".into(),
            name: "Juan Pérez".into(),
            license_number: Some("LIC-445566".into()),
            license_type: Some("E".into()),
        }],
    }
}

/// Everything a pipeline test needs, with handles kept for assertions.
pub struct Harness {
    pub ledger: Arc<CreditLedger>,
    pub pac: Arc<MockPacAdapter>,
    pub artifacts: Arc<ArtifactStore>,
    pub documents: Arc<InMemoryDocumentStore>,
    pub pipeline: Pipeline,
}

/// Assemble a pipeline over in-memory collaborators and the bundled
/// catalog, with a scriptable mock provider.
pub fn harness() -> Harness {
    harness_with_pac(Arc::new(MockPacAdapter::new()))
}

/// Like [`harness`], but with an externally scripted mock provider.
pub fn harness_with_pac(pac: Arc<MockPacAdapter>) -> Harness {
    let ledger = Arc::new(CreditLedger::new());
    let artifacts = Arc::new(ArtifactStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());

    let pipeline = Pipeline::new(
        ValidationEngine::new(Arc::new(SnapshotCatalog::with_builtin_data())),
        Generator::new(Arc::clone(&artifacts)),
        Arc::clone(&ledger),
        Arc::clone(&pac) as Arc<dyn PacAdapter>,
        Arc::clone(&documents) as _,
    );

    Harness {
        ledger,
        pac,
        artifacts,
        documents,
        pipeline,
    }
}

/// Assemble a pipeline around an arbitrary provider adapter (for wiremock
/// and closed-port transport tests).
pub fn harness_with_adapter(pac: Arc<dyn PacAdapter>) -> (Arc<CreditLedger>, Arc<InMemoryDocumentStore>, Pipeline) {
    let ledger = Arc::new(CreditLedger::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    let pipeline = Pipeline::new(
        ValidationEngine::new(Arc::new(SnapshotCatalog::with_builtin_data())),
        Generator::new(Arc::new(ArtifactStore::new())),
        Arc::clone(&ledger),
        pac,
        Arc::clone(&documents) as _,
    );
    (ledger, documents, pipeline)
}

/// Assemble a pipeline over a caller-supplied document store (for
/// competing-writer tests).
pub fn harness_with_store(
    documents: Arc<dyn DocumentStore>,
) -> (Arc<CreditLedger>, Arc<MockPacAdapter>, Pipeline) {
    let ledger = Arc::new(CreditLedger::new());
    let pac = Arc::new(MockPacAdapter::new());
    let pipeline = Pipeline::new(
        ValidationEngine::new(Arc::new(SnapshotCatalog::with_builtin_data())),
        Generator::new(Arc::new(ArtifactStore::new())),
        Arc::clone(&ledger),
        Arc::clone(&pac) as Arc<dyn PacAdapter>,
        documents,
    );
    (ledger, pac, pipeline)
}

/// Open and fund an account with prepaid units.
pub fn fund(ledger: &CreditLedger, account: AccountId, prepaid: u64) {
    ledger.open_account(account);
    if prepaid > 0 {
        ledger
            .replenish(account, prepaid, Bucket::Prepaid, "test-funding")
            .expect("funding a fresh test account");
    }
}
