//! # Canonical Generator — Draft to Regulator Node Tree
//!
//! Deterministic field mapping from a validated draft to the regulator's
//! node tree, emitted through the single canonical-bytes path. No business
//! rule runs here; rule checking belongs to the validation engine, and the
//! generator only refuses to run without a current, certifiable validation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use porteo_core::{
    sha256_digest, ActorRole, ArtifactId, CanonicalBytes, CanonicalizationError, ContentDigest,
    DocumentDraft, DocumentId, LocationRole, Timestamp,
};
use porteo_validation::ValidationResult;

use crate::store::{ArtifactStore, RepresentationKind};

/// Carta Porte complement version emitted in the canonical tree.
const CARTA_PORTE_VERSION: &str = "3.1";

/// Errors from artifact generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The validation result has blocking findings.
    #[error("draft is not certifiable: {blocking} blocking finding(s)")]
    NotCertifiable {
        /// How many blocking findings the validation carries.
        blocking: usize,
    },

    /// The validation result belongs to an older revision of the draft.
    #[error("validation is stale: validated digest {validated} != draft digest {current}")]
    StaleValidation {
        /// Digest the validation ran against.
        validated: ContentDigest,
        /// Digest of the draft as passed in.
        current: ContentDigest,
    },

    /// Canonical byte production failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The emitted output failed its own structural re-parse. Nothing was
    /// persisted.
    #[error("self-check failed on generated output: {reason}")]
    SelfCheck {
        /// What the re-parse found wrong.
        reason: String,
    },
}

/// Errors from parsing canonical bytes back into the node tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not a well-formed canonical document.
    #[error("malformed canonical document: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ─── Canonical node tree ─────────────────────────────────────────────

/// Root of the canonical document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    /// The fiscal voucher node.
    pub comprobante: ComprobanteNode,
}

/// Fiscal voucher: kind, parties, and the Carta Porte complement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprobanteNode {
    pub tipo_comprobante: String,
    pub emisor: PartyNode,
    pub receptor: PartyNode,
    pub complemento: ComplementoNode,
}

/// Issuer or recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyNode {
    pub rfc: String,
    pub nombre: String,
}

/// Complement wrapper; the Carta Porte node is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplementoNode {
    pub carta_porte: CartaPorteNode,
}

/// The Carta Porte complement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartaPorteNode {
    pub version: String,
    pub transporte_internacional: bool,
    pub total_distancia_km: u64,
    pub ubicaciones: Vec<UbicacionNode>,
    pub mercancias: MercanciasNode,
    pub autotransporte: AutotransporteNode,
    pub figura_transporte: Vec<FiguraNode>,
}

/// One route location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UbicacionNode {
    pub tipo_ubicacion: String,
    pub calle: String,
    pub municipio: String,
    pub estado: String,
    pub pais: String,
    pub codigo_postal: String,
    pub fecha_hora: Timestamp,
    pub distancia_km: u64,
}

/// Goods summary plus line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MercanciasNode {
    pub peso_bruto_total_kg: u64,
    pub numero_total: u64,
    pub items: Vec<MercanciaNode>,
}

/// One goods line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MercanciaNode {
    pub descripcion: String,
    pub clave_prod_serv: String,
    pub clave_unidad: String,
    pub cantidad: u64,
    pub peso_kg: u64,
    pub valor_mercancia_cents: u64,
    pub material_peligroso: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clave_material_peligroso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_embalaje: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permiso_especial: Option<String>,
}

/// The vehicle node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotransporteNode {
    pub placa: String,
    pub config_vehicular: String,
    pub anio_modelo: u32,
    pub peso_bruto_vehicular_kg: u64,
    pub tipo_permiso: String,
    pub numero_permiso: String,
    pub aseguradora: String,
    pub poliza: String,
}

/// One transport figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiguraNode {
    pub tipo_figura: String,
    pub rfc: String,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_licencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_licencia: Option<String>,
}

/// Canonical string for a location role.
pub fn tipo_ubicacion(role: LocationRole) -> &'static str {
    match role {
        LocationRole::Origin => "origen",
        LocationRole::Destination => "destino",
        LocationRole::IntermediateStop => "paso_intermedio",
    }
}

/// Canonical string for an actor role.
pub fn tipo_figura(role: ActorRole) -> &'static str {
    match role {
        ActorRole::Operator => "operador",
        ActorRole::Owner => "propietario",
        ActorRole::Lessee => "arrendatario",
        ActorRole::Notified => "notificado",
    }
}

/// Parse canonical bytes back into the typed node tree.
///
/// Used by the generator's self-check and by consumers that need to read
/// fields out of a stored artifact. Missing mandatory nodes surface as
/// [`ParseError::Malformed`] because every mandatory field is required by
/// the types.
pub fn parse(bytes: &[u8]) -> Result<CanonicalDocument, ParseError> {
    Ok(serde_json::from_slice(bytes)?)
}

// ─── Artifact ────────────────────────────────────────────────────────

/// A freshly generated canonical artifact, already persisted as the latest
/// canonical version for its document.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalArtifact {
    /// Stored-version identity.
    pub id: ArtifactId,
    /// The document this artifact renders.
    pub document: DocumentId,
    /// Digest of the draft revision the artifact was generated from.
    pub draft_digest: ContentDigest,
    /// Digest of the canonical bytes themselves; the artifact's content
    /// identity for duplicate-submission purposes.
    pub content_digest: ContentDigest,
    /// The canonical bytes.
    pub bytes: CanonicalBytes,
    /// Version number in the artifact store.
    pub version: u32,
    /// When the artifact was generated.
    pub generated_at: Timestamp,
}

/// The canonical serializer.
pub struct Generator {
    store: Arc<ArtifactStore>,
}

impl Generator {
    /// Build a generator that persists into the given store.
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Access the backing store.
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Generate the canonical artifact for a validated draft.
    ///
    /// Refuses when the validation has blocking findings or was computed for
    /// a different draft revision. On success the artifact is persisted as
    /// the latest canonical version for the document; on any failure nothing
    /// is persisted.
    pub fn generate(
        &self,
        draft: &DocumentDraft,
        validation: &ValidationResult,
    ) -> Result<CanonicalArtifact, GenerateError> {
        if !validation.is_certifiable() {
            return Err(GenerateError::NotCertifiable {
                blocking: validation.blocking_count(),
            });
        }
        let current = draft.digest()?;
        if validation.digest != current {
            return Err(GenerateError::StaleValidation {
                validated: validation.digest,
                current,
            });
        }

        let tree = build_tree(draft);
        let bytes = CanonicalBytes::new(&tree)?;
        self_check(&bytes, draft)?;

        let stored = self
            .store
            .append(draft.id, RepresentationKind::Canonical, bytes.as_bytes().to_vec());
        let content_digest = sha256_digest(&bytes);
        tracing::info!(
            document = %draft.id,
            version = stored.version,
            content = %content_digest,
            "canonical artifact generated"
        );

        Ok(CanonicalArtifact {
            id: stored.id,
            document: draft.id,
            draft_digest: current,
            content_digest,
            bytes,
            version: stored.version,
            generated_at: stored.stored_at,
        })
    }
}

/// Pure field mapping from the draft to the node tree. Emits no timestamps
/// of its own: identical drafts map to identical trees.
fn build_tree(draft: &DocumentDraft) -> CanonicalDocument {
    CanonicalDocument {
        comprobante: ComprobanteNode {
            tipo_comprobante: draft.kind.as_str().to_string(),
            emisor: PartyNode {
                rfc: draft.issuer_rfc.clone(),
                nombre: draft.issuer_name.clone(),
            },
            receptor: PartyNode {
                rfc: draft.recipient_rfc.clone(),
                nombre: draft.recipient_name.clone(),
            },
            complemento: ComplementoNode {
                carta_porte: CartaPorteNode {
                    version: CARTA_PORTE_VERSION.to_string(),
                    transporte_internacional: draft.international,
                    total_distancia_km: draft.total_distance_km(),
                    ubicaciones: draft
                        .locations
                        .iter()
                        .map(|l| UbicacionNode {
                            tipo_ubicacion: tipo_ubicacion(l.role).to_string(),
                            calle: l.street.clone(),
                            municipio: l.municipality.clone(),
                            estado: l.state_code.clone(),
                            pais: l.country_code.clone(),
                            codigo_postal: l.postal_code.clone(),
                            fecha_hora: l.scheduled_at,
                            distancia_km: l.distance_km,
                        })
                        .collect(),
                    mercancias: MercanciasNode {
                        peso_bruto_total_kg: draft.total_goods_weight_kg(),
                        numero_total: draft.goods.len() as u64,
                        items: draft
                            .goods
                            .iter()
                            .map(|g| MercanciaNode {
                                descripcion: g.description.clone(),
                                clave_prod_serv: g.product_code.clone(),
                                clave_unidad: g.unit_code.clone(),
                                cantidad: g.quantity,
                                peso_kg: g.weight_kg,
                                valor_mercancia_cents: g.declared_value_cents,
                                material_peligroso: g.hazardous,
                                clave_material_peligroso: g.hazmat_code.clone(),
                                tipo_embalaje: g.packaging_code.clone(),
                                permiso_especial: g.special_permit.clone(),
                            })
                            .collect(),
                    },
                    autotransporte: AutotransporteNode {
                        placa: draft.transport_unit.plate.clone(),
                        config_vehicular: draft.transport_unit.vehicle_config_code.clone(),
                        anio_modelo: draft.transport_unit.model_year,
                        peso_bruto_vehicular_kg: draft.transport_unit.gross_weight_kg,
                        tipo_permiso: draft.transport_unit.permit_type.clone(),
                        numero_permiso: draft.transport_unit.permit_number.clone(),
                        aseguradora: draft.transport_unit.insurance_carrier.clone(),
                        poliza: draft.transport_unit.insurance_policy.clone(),
                    },
                    figura_transporte: draft
                        .actors
                        .iter()
                        .map(|a| FiguraNode {
                            tipo_figura: tipo_figura(a.role).to_string(),
                            rfc: a.rfc.clone(),
                            nombre: a.name.clone(),
                            numero_licencia: a.license_number.clone(),
                            tipo_licencia: a.license_type.clone(),
                        })
                        .collect(),
                },
            },
        },
    }
}

/// Re-parse the emitted bytes and assert structural completeness against the
/// draft. Every check here is about the *output*, not the draft: the draft
/// was already validated.
fn self_check(bytes: &CanonicalBytes, draft: &DocumentDraft) -> Result<(), GenerateError> {
    let doc = parse(bytes.as_bytes()).map_err(|e| GenerateError::SelfCheck {
        reason: format!("output does not re-parse: {e}"),
    })?;

    let cp = &doc.comprobante.complemento.carta_porte;
    let checks: [(&str, bool); 7] = [
        ("emisor.rfc present", !doc.comprobante.emisor.rfc.is_empty()),
        (
            "receptor.rfc present",
            !doc.comprobante.receptor.rfc.is_empty(),
        ),
        (
            "ubicaciones count matches draft",
            cp.ubicaciones.len() == draft.locations.len(),
        ),
        (
            "mercancias count matches draft",
            cp.mercancias.items.len() == draft.goods.len()
                && cp.mercancias.numero_total as usize == draft.goods.len(),
        ),
        (
            "figura_transporte count matches draft",
            cp.figura_transporte.len() == draft.actors.len(),
        ),
        ("autotransporte.placa present", !cp.autotransporte.placa.is_empty()),
        ("complement version present", !cp.version.is_empty()),
    ];

    for (name, ok) in checks {
        if !ok {
            return Err(GenerateError::SelfCheck {
                reason: format!("structural check failed: {name}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use porteo_catalog::SnapshotCatalog;
    use porteo_core::{AccountId, DocumentKind, GoodsItem, Location, TransportActor, TransportUnit};
    use porteo_validation::{Finding, ValidationEngine, ValidationResult};

    fn clean_draft() -> DocumentDraft {
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
                    scheduled_at: Timestamp::parse("2026-03-15T08:00:00Z").unwrap(),
                    distance_km: 0,
                },
                Location {
                    role: LocationRole::Destination,
                    street: "Calle 5 de Febrero 99".into(),
                    municipality: "Querétaro".into(),
                    state_code: "QUE".into(),
                    country_code: "MEX".into(),
                    postal_code: "76000".into(),
                    scheduled_at: Timestamp::parse("2026-03-15T16:00:00Z").unwrap(),
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

    async fn validated(draft: &DocumentDraft) -> ValidationResult {
        let engine = ValidationEngine::new(std::sync::Arc::new(
            SnapshotCatalog::with_builtin_data(),
        ));
        engine.validate(draft).await.unwrap()
    }

    #[tokio::test]
    async fn generates_and_persists_latest_version() {
        let generator = Generator::new(Arc::new(ArtifactStore::new()));
        let draft = clean_draft();
        let validation = validated(&draft).await;

        let artifact = generator.generate(&draft, &validation).unwrap();
        assert_eq!(artifact.version, 1);

        let stored = generator
            .store()
            .latest(draft.id, RepresentationKind::Canonical)
            .unwrap();
        assert_eq!(stored.bytes, artifact.bytes.as_bytes());
    }

    #[tokio::test]
    async fn refuses_uncertifiable_validation() {
        let generator = Generator::new(Arc::new(ArtifactStore::new()));
        let draft = clean_draft();
        let digest = draft.digest().unwrap();
        let validation = ValidationResult::new(
            digest,
            vec![Finding::blocking("CP-TST-001", "issuer_rfc", "bad")],
        );

        match generator.generate(&draft, &validation) {
            Err(GenerateError::NotCertifiable { blocking }) => assert_eq!(blocking, 1),
            other => panic!("expected NotCertifiable, got {other:?}"),
        }
        // Fail closed: nothing persisted.
        assert_eq!(
            generator
                .store()
                .version_count(draft.id, RepresentationKind::Canonical),
            0
        );
    }

    #[tokio::test]
    async fn refuses_stale_validation() {
        let generator = Generator::new(Arc::new(ArtifactStore::new()));
        let mut draft = clean_draft();
        let validation = validated(&draft).await;

        // Edit after validation.
        draft.goods[0].weight_kg = 600;
        match generator.generate(&draft, &validation) {
            Err(GenerateError::StaleValidation { .. }) => {}
            other => panic!("expected StaleValidation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generation_is_deterministic() {
        let generator = Generator::new(Arc::new(ArtifactStore::new()));
        let draft = clean_draft();
        let validation = validated(&draft).await;

        let a = generator.generate(&draft, &validation).unwrap();
        let b = generator.generate(&draft, &validation).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.content_digest, b.content_digest);
        // Each generation is its own stored version.
        assert_eq!(b.version, 2);
    }

    #[tokio::test]
    async fn round_trip_recovers_mandatory_fields() {
        let generator = Generator::new(Arc::new(ArtifactStore::new()));
        let draft = clean_draft();
        let validation = validated(&draft).await;
        let artifact = generator.generate(&draft, &validation).unwrap();

        let doc = parse(artifact.bytes.as_bytes()).unwrap();
        let comprobante = &doc.comprobante;
        assert_eq!(comprobante.tipo_comprobante, "traslado");
        assert_eq!(comprobante.emisor.rfc, draft.issuer_rfc);
        assert_eq!(comprobante.receptor.rfc, draft.recipient_rfc);

        let cp = &comprobante.complemento.carta_porte;
        assert_eq!(cp.transporte_internacional, draft.international);
        assert_eq!(cp.total_distancia_km, draft.total_distance_km());
        assert_eq!(cp.ubicaciones.len(), draft.locations.len());
        assert_eq!(cp.ubicaciones[0].tipo_ubicacion, "origen");
        assert_eq!(cp.ubicaciones[0].codigo_postal, draft.locations[0].postal_code);
        assert_eq!(cp.ubicaciones[1].fecha_hora, draft.locations[1].scheduled_at);
        assert_eq!(cp.mercancias.peso_bruto_total_kg, draft.total_goods_weight_kg());
        assert_eq!(cp.mercancias.items[0].clave_prod_serv, draft.goods[0].product_code);
        assert_eq!(cp.mercancias.items[0].peso_kg, draft.goods[0].weight_kg);
        assert_eq!(cp.autotransporte.placa, draft.transport_unit.plate);
        assert_eq!(cp.autotransporte.numero_permiso, draft.transport_unit.permit_number);
        assert_eq!(cp.figura_transporte[0].tipo_figura, "operador");
        assert_eq!(cp.figura_transporte[0].rfc, draft.actors[0].rfc);
        assert_eq!(
            cp.figura_transporte[0].numero_licencia,
            draft.actors[0].license_number
        );
    }

    #[test]
    fn parse_rejects_missing_mandatory_node() {
        // Well-formed JSON missing the complemento node entirely.
        let bytes = br#"{"comprobante":{"tipo_comprobante":"traslado","emisor":{"rfc":"A","nombre":"B"},"receptor":{"rfc":"C","nombre":"D"}}}"#;
        assert!(parse(bytes).is_err());
    }
}
