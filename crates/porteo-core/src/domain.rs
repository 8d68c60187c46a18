//! # Domain Model — Transport Document Draft
//!
//! The mutable, editable representation of a Carta Porte transport document.
//! A draft is owned by exactly one account and stays mutable until it is
//! certified.
//!
//! ## Units
//!
//! All quantities are integers in their smallest practical unit: weights in
//! kilograms, declared values in centavos, distances in kilometres. Floats
//! never appear in the model, so every draft canonicalizes under the
//! [`crate::CanonicalBytes`] float-rejection rule and has a stable
//! [`crate::ContentDigest`] for the validation cache.
//!
//! ## Identifier fields
//!
//! Issuer, recipient, and actor tax identifiers are plain strings here.
//! Drafts are captured from user input and may be malformed; the validation
//! engine reports a bad RFC as a blocking finding with a field path instead
//! of refusing to load the draft. See [`crate::identity::Rfc`].

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::CanonicalizationError;
use crate::identity::{AccountId, DocumentId};
use crate::temporal::Timestamp;

/// The fiscal kind of the transport document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// CFDI de Ingreso: the carrier invoices the transport service.
    Ingreso,
    /// CFDI de Traslado: the owner moves its own goods.
    Traslado,
}

impl DocumentKind {
    /// String form used in the canonical artifact.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingreso => "ingreso",
            Self::Traslado => "traslado",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a location in the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRole {
    /// Route origin. Timestamp is the scheduled departure.
    Origin,
    /// Route destination. Timestamp is the scheduled arrival.
    Destination,
    /// Intermediate stop along the route.
    IntermediateStop,
}

/// One stop on the transport route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Role of this location in the route.
    pub role: LocationRole,
    /// Street address line.
    pub street: String,
    /// Municipality or locality name.
    pub municipality: String,
    /// Federal entity (state) code, e.g. `JAL`.
    pub state_code: String,
    /// ISO country code, e.g. `MEX`.
    pub country_code: String,
    /// Postal code, checked against the SAT postal-code catalog.
    pub postal_code: String,
    /// Scheduled departure (origins) or arrival (destinations/stops).
    pub scheduled_at: Timestamp,
    /// Distance travelled to reach this location, in kilometres.
    /// Zero for the origin.
    pub distance_km: u64,
}

/// One line of transported goods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsItem {
    /// Free-text description of the goods.
    pub description: String,
    /// SAT product/service code (c_ClaveProdServCP).
    pub product_code: String,
    /// SAT unit code (c_ClaveUnidad).
    pub unit_code: String,
    /// Quantity in the declared unit.
    pub quantity: u64,
    /// Weight in kilograms.
    pub weight_kg: u64,
    /// Declared value in centavos (MXN).
    pub declared_value_cents: u64,
    /// Whether the goods are hazardous material.
    pub hazardous: bool,
    /// SAT hazardous-material code (c_MaterialPeligroso); required when
    /// `hazardous` is set.
    #[serde(default)]
    pub hazmat_code: Option<String>,
    /// SAT packaging code (c_TipoEmbalaje); required when `hazardous` is set.
    #[serde(default)]
    pub packaging_code: Option<String>,
    /// Special-permit number; required when the description matches a
    /// regulated substance class.
    #[serde(default)]
    pub special_permit: Option<String>,
}

/// The vehicle performing the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportUnit {
    /// License plate, as registered.
    pub plate: String,
    /// SAT vehicle configuration code (c_ConfigAutotransporte), e.g. `C2`.
    pub vehicle_config_code: String,
    /// Vehicle model year.
    pub model_year: u32,
    /// Gross vehicle weight in kilograms (vehicle plus maximum cargo).
    pub gross_weight_kg: u64,
    /// SCT permit type code (c_TipoPermiso).
    pub permit_type: String,
    /// SCT permit number.
    pub permit_number: String,
    /// Insurance carrier name.
    pub insurance_carrier: String,
    /// Insurance policy number.
    pub insurance_policy: String,
}

/// Role of a person involved in the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Driver of the transport unit. At least one is required.
    Operator,
    /// Owner of the transport unit.
    Owner,
    /// Lessee operating a rented unit.
    Lessee,
    /// Party to be notified on arrival.
    Notified,
}

/// A person involved in the transport (figura de transporte).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportActor {
    /// Role of this actor.
    pub role: ActorRole,
    /// Taxpayer identifier (RFC). Validated by the validation engine.
    pub rfc: String,
    /// Legal name.
    pub name: String,
    /// Driver's license number. Expected for operators.
    #[serde(default)]
    pub license_number: Option<String>,
    /// Driver's license type/class. Expected for operators.
    #[serde(default)]
    pub license_type: Option<String>,
}

/// The mutable transport-document draft the pipeline operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Document identity, stable across the whole lifecycle.
    pub id: DocumentId,
    /// Owning account. Drafts are only visible to their owner.
    pub account: AccountId,
    /// Issuer taxpayer identifier (RFC).
    pub issuer_rfc: String,
    /// Issuer legal name.
    pub issuer_name: String,
    /// Recipient taxpayer identifier (RFC).
    pub recipient_rfc: String,
    /// Recipient legal name.
    pub recipient_name: String,
    /// Fiscal kind of the document.
    pub kind: DocumentKind,
    /// Whether the transport crosses the border.
    pub international: bool,
    /// Ordered route locations.
    pub locations: Vec<Location>,
    /// Transported goods.
    pub goods: Vec<GoodsItem>,
    /// The vehicle.
    pub transport_unit: TransportUnit,
    /// People involved in the transport.
    pub actors: Vec<TransportActor>,
}

impl DocumentDraft {
    /// Sum of goods weights in kilograms.
    pub fn total_goods_weight_kg(&self) -> u64 {
        self.goods.iter().map(|g| g.weight_kg).sum()
    }

    /// Sum of per-location distances in kilometres.
    pub fn total_distance_km(&self) -> u64 {
        self.locations.iter().map(|l| l.distance_km).sum()
    }

    /// Locations with the given role, in route order.
    pub fn locations_with_role(&self, role: LocationRole) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(move |l| l.role == role)
    }

    /// Actors with the given role.
    pub fn actors_with_role(&self, role: ActorRole) -> impl Iterator<Item = &TransportActor> {
        self.actors.iter().filter(move |a| a.role == role)
    }

    /// Whether any location lies outside Mexico.
    pub fn has_foreign_location(&self) -> bool {
        self.locations.iter().any(|l| l.country_code != "MEX")
    }

    /// Content digest of the draft, used to key the validation cache and to
    /// guard the serializer against stale validation results.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> DocumentDraft {
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

    #[test]
    fn totals_sum_over_parts() {
        let draft = sample_draft();
        assert_eq!(draft.total_goods_weight_kg(), 500);
        assert_eq!(draft.total_distance_km(), 350);
    }

    #[test]
    fn role_filters() {
        let draft = sample_draft();
        assert_eq!(draft.locations_with_role(LocationRole::Origin).count(), 1);
        assert_eq!(draft.actors_with_role(ActorRole::Operator).count(), 1);
        assert_eq!(draft.actors_with_role(ActorRole::Owner).count(), 0);
    }

    #[test]
    fn digest_stable_until_edit() {
        let mut draft = sample_draft();
        let before = draft.digest().unwrap();
        assert_eq!(before, draft.digest().unwrap());
        draft.goods[0].weight_kg = 501;
        assert_ne!(before, draft.digest().unwrap());
    }

    #[test]
    fn foreign_location_detection() {
        let mut draft = sample_draft();
        assert!(!draft.has_foreign_location());
        draft.locations[1].country_code = "USA".into();
        assert!(draft.has_foreign_location());
    }

    #[test]
    fn draft_round_trips_through_serde() {
        let draft = sample_draft();
        let json = serde_json::to_string(&draft).unwrap();
        let back: DocumentDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(draft, back);
    }
}
