//! # Validation Engine — Six Fixed Stages
//!
//! The engine owns a catalog handle and the result cache. `validate()` is a
//! pure function of the draft content and the catalog snapshot: identical
//! input yields an identical set of findings, which is what makes the
//! digest-keyed cache sound.
//!
//! Stage order is fixed and every stage always runs. Findings are appended in
//! stage order so presentation can group them stably.

use std::sync::Arc;

use thiserror::Error;

use porteo_catalog::{CatalogKind, CatalogStore};
use porteo_core::{
    ActorRole, CanonicalizationError, DocumentDraft, LocationRole, Rfc, Timestamp,
};

use crate::cache::ValidationCache;
use crate::finding::{Finding, ValidationResult};
use crate::substances::is_regulated_substance;

/// Model years this far in the future are rejected (next year's models ship
/// early, two years out is a typo).
const MODEL_YEAR_HEADROOM: i32 = 1;

/// Oldest model year accepted for federal cargo transport.
const MODEL_YEAR_FLOOR: i32 = 1970;

/// Errors from the validation engine itself.
///
/// Rule violations are never errors; they are findings inside the result.
/// This enum only covers failures to *run* validation at all.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The draft could not be canonicalized for digest computation.
    #[error("draft cannot be canonicalized: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// The staged validation engine.
pub struct ValidationEngine {
    catalog: Arc<dyn CatalogStore>,
    cache: ValidationCache,
}

impl ValidationEngine {
    /// Build an engine over a catalog backend.
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog,
            cache: ValidationCache::new(),
        }
    }

    /// Validate a draft, returning the aggregated result.
    ///
    /// Re-validating an unchanged draft returns the cached result for its
    /// content digest without re-running any stage.
    pub async fn validate(&self, draft: &DocumentDraft) -> Result<ValidationResult, ValidationError> {
        let digest = draft.digest()?;
        if let Some(hit) = self.cache.get(&digest) {
            tracing::debug!(document = %draft.id, digest = %digest, "validation cache hit");
            return Ok(hit);
        }

        let mut findings = Vec::new();
        self.check_identity(draft, &mut findings);
        self.check_locations(draft, &mut findings).await;
        self.check_goods(draft, &mut findings).await;
        self.check_transport_unit(draft, &mut findings).await;
        self.check_actors(draft, &mut findings);
        self.check_coherence(draft, &mut findings);

        let result = ValidationResult::new(digest, findings);
        tracing::info!(
            document = %draft.id,
            blocking = result.blocking_count(),
            total = result.findings.len(),
            score = result.score,
            "draft validated"
        );
        self.cache.insert(result.clone());
        Ok(result)
    }

    /// Stage 1: issuer and recipient identity fields.
    fn check_identity(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        if !Rfc::is_valid(&draft.issuer_rfc) {
            findings.push(Finding::blocking(
                "CP-ID-001",
                "issuer_rfc",
                format!("issuer RFC {:?} is not a valid SAT RFC", draft.issuer_rfc),
            ));
        }
        if draft.issuer_name.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-ID-002",
                "issuer_name",
                "issuer name is required",
            ));
        }
        if !Rfc::is_valid(&draft.recipient_rfc) {
            findings.push(Finding::blocking(
                "CP-ID-003",
                "recipient_rfc",
                format!(
                    "recipient RFC {:?} is not a valid SAT RFC",
                    draft.recipient_rfc
                ),
            ));
        }
        if draft.recipient_name.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-ID-004",
                "recipient_name",
                "recipient name is required",
            ));
        }
    }

    /// Stage 2: route locations.
    async fn check_locations(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        if draft.locations_with_role(LocationRole::Origin).count() == 0 {
            findings.push(Finding::blocking(
                "CP-LOC-001",
                "locations",
                "route must include at least one origin",
            ));
        }
        if draft
            .locations_with_role(LocationRole::Destination)
            .count()
            == 0
        {
            findings.push(Finding::blocking(
                "CP-LOC-002",
                "locations",
                "route must include at least one destination",
            ));
        }

        for (i, loc) in draft.locations.iter().enumerate() {
            for (name, value) in [
                ("street", &loc.street),
                ("municipality", &loc.municipality),
                ("state_code", &loc.state_code),
                ("country_code", &loc.country_code),
                ("postal_code", &loc.postal_code),
            ] {
                if value.trim().is_empty() {
                    findings.push(Finding::blocking(
                        "CP-LOC-003",
                        format!("locations[{i}].{name}"),
                        format!("location {name} is required"),
                    ));
                }
            }

            if !loc.country_code.trim().is_empty() {
                self.require_known_code(
                    findings,
                    CatalogKind::Countries,
                    &loc.country_code,
                    format!("locations[{i}].country_code"),
                    "CP-LOC-007",
                )
                .await;
            }
            // The SAT postal catalog covers domestic codes only.
            if loc.country_code == "MEX" && !loc.postal_code.trim().is_empty() {
                self.require_known_code(
                    findings,
                    CatalogKind::PostalCodes,
                    &loc.postal_code,
                    format!("locations[{i}].postal_code"),
                    "CP-LOC-004",
                )
                .await;
            }
        }

        // Timestamps must not go backwards along the route order.
        for i in 1..draft.locations.len() {
            if draft.locations[i].scheduled_at < draft.locations[i - 1].scheduled_at {
                findings.push(Finding::blocking(
                    "CP-LOC-005",
                    format!("locations[{i}].scheduled_at"),
                    "location timestamps must be monotonically non-decreasing along the route",
                ));
            }
        }

        // Arrival at the (last) destination must be strictly after departure
        // from the (first) origin.
        let origin_ts: Option<Timestamp> = draft
            .locations_with_role(LocationRole::Origin)
            .map(|l| l.scheduled_at)
            .next();
        let destination_ts: Option<Timestamp> = draft
            .locations_with_role(LocationRole::Destination)
            .map(|l| l.scheduled_at)
            .last();
        if let (Some(departure), Some(arrival)) = (origin_ts, destination_ts) {
            if arrival <= departure {
                findings.push(Finding::blocking(
                    "CP-LOC-006",
                    "locations[].scheduled_at",
                    "destination arrival must be after origin departure",
                ));
            }
        }
    }

    /// Stage 3: goods items.
    async fn check_goods(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        if draft.goods.is_empty() {
            findings.push(Finding::blocking(
                "CP-GDS-001",
                "goods",
                "at least one goods item is required",
            ));
        }

        for (i, item) in draft.goods.iter().enumerate() {
            if item.description.trim().is_empty() {
                findings.push(Finding::blocking(
                    "CP-GDS-002",
                    format!("goods[{i}].description"),
                    "goods description is required",
                ));
            }
            if item.product_code.trim().is_empty() {
                findings.push(Finding::blocking(
                    "CP-GDS-003",
                    format!("goods[{i}].product_code"),
                    "product code is required",
                ));
            } else {
                self.require_known_code(
                    findings,
                    CatalogKind::ProductServiceCodes,
                    &item.product_code,
                    format!("goods[{i}].product_code"),
                    "CP-GDS-004",
                )
                .await;
            }
            if item.unit_code.trim().is_empty() {
                findings.push(Finding::blocking(
                    "CP-GDS-005",
                    format!("goods[{i}].unit_code"),
                    "unit code is required",
                ));
            } else {
                self.require_known_code(
                    findings,
                    CatalogKind::UnitCodes,
                    &item.unit_code,
                    format!("goods[{i}].unit_code"),
                    "CP-GDS-006",
                )
                .await;
            }
            if item.quantity == 0 {
                findings.push(Finding::blocking(
                    "CP-GDS-007",
                    format!("goods[{i}].quantity"),
                    "quantity must be positive",
                ));
            }
            if item.weight_kg == 0 {
                findings.push(Finding::blocking(
                    "CP-GDS-008",
                    format!("goods[{i}].weight_kg"),
                    "weight must be positive",
                ));
            }

            if item.hazardous {
                match &item.hazmat_code {
                    None => findings.push(Finding::blocking(
                        "CP-GDS-009",
                        format!("goods[{i}].hazmat_code"),
                        "hazardous goods require a hazardous-material code",
                    )),
                    Some(code) => {
                        self.require_known_code(
                            findings,
                            CatalogKind::HazmatCodes,
                            code,
                            format!("goods[{i}].hazmat_code"),
                            "CP-GDS-010",
                        )
                        .await;
                    }
                }
                match &item.packaging_code {
                    None => findings.push(Finding::blocking(
                        "CP-GDS-011",
                        format!("goods[{i}].packaging_code"),
                        "hazardous goods require a packaging code",
                    )),
                    Some(code) => {
                        self.require_known_code(
                            findings,
                            CatalogKind::PackagingCodes,
                            code,
                            format!("goods[{i}].packaging_code"),
                            "CP-GDS-012",
                        )
                        .await;
                    }
                }
            }

            if is_regulated_substance(&item.description) && item.special_permit.is_none() {
                findings.push(Finding::blocking(
                    "CP-GDS-013",
                    format!("goods[{i}].special_permit"),
                    format!(
                        "description {:?} matches a regulated substance; a special-permit number is required",
                        item.description
                    ),
                ));
            }

            if item.declared_value_cents == 0 {
                findings.push(Finding::advisory(
                    "CP-GDS-014",
                    format!("goods[{i}].declared_value_cents"),
                    "declared value of zero weakens insurance claims on loss",
                ));
            }
        }
    }

    /// Stage 4: transport unit.
    async fn check_transport_unit(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        let unit = &draft.transport_unit;

        if unit.plate.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-VEH-001",
                "transport_unit.plate",
                "license plate is required",
            ));
        } else if !plate_looks_valid(&unit.plate) {
            findings.push(Finding::warning(
                "CP-VEH-002",
                "transport_unit.plate",
                format!("plate {:?} does not look like a registered plate", unit.plate),
            ));
        }

        if unit.vehicle_config_code.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-VEH-003",
                "transport_unit.vehicle_config_code",
                "vehicle configuration code is required",
            ));
        } else {
            self.require_known_code(
                findings,
                CatalogKind::VehicleConfigs,
                &unit.vehicle_config_code,
                "transport_unit.vehicle_config_code".to_string(),
                "CP-VEH-004",
            )
            .await;
        }

        let current_year = chrono::Datelike::year(porteo_core::Timestamp::now().as_datetime());
        let year = unit.model_year as i32;
        if year < MODEL_YEAR_FLOOR || year > current_year + MODEL_YEAR_HEADROOM {
            findings.push(Finding::blocking(
                "CP-VEH-005",
                "transport_unit.model_year",
                format!(
                    "model year {year} outside the accepted range {MODEL_YEAR_FLOOR}..={}",
                    current_year + MODEL_YEAR_HEADROOM
                ),
            ));
        }

        if unit.gross_weight_kg == 0 {
            findings.push(Finding::blocking(
                "CP-VEH-006",
                "transport_unit.gross_weight_kg",
                "gross vehicle weight must be positive",
            ));
        }

        if unit.permit_type.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-VEH-007",
                "transport_unit.permit_type",
                "SCT permit type is required",
            ));
        } else {
            self.require_known_code(
                findings,
                CatalogKind::PermitTypes,
                &unit.permit_type,
                "transport_unit.permit_type".to_string(),
                "CP-VEH-008",
            )
            .await;
        }
        if unit.permit_number.trim().is_empty() {
            findings.push(Finding::blocking(
                "CP-VEH-009",
                "transport_unit.permit_number",
                "SCT permit number is required",
            ));
        }

        if unit.insurance_carrier.trim().is_empty() || unit.insurance_policy.trim().is_empty() {
            findings.push(Finding::warning(
                "CP-VEH-010",
                "transport_unit.insurance_policy",
                "insurance carrier and policy number are expected for federal transport",
            ));
        }
    }

    /// Stage 5: transport actors.
    fn check_actors(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        if draft.actors_with_role(ActorRole::Operator).count() == 0 {
            findings.push(Finding::blocking(
                "CP-ACT-001",
                "actors",
                "at least one operator is required",
            ));
        }

        for (i, actor) in draft.actors.iter().enumerate() {
            if !Rfc::is_valid(&actor.rfc) {
                findings.push(Finding::blocking(
                    "CP-ACT-002",
                    format!("actors[{i}].rfc"),
                    format!("actor RFC {:?} is not a valid SAT RFC", actor.rfc),
                ));
            }
            if actor.name.trim().is_empty() {
                findings.push(Finding::blocking(
                    "CP-ACT-003",
                    format!("actors[{i}].name"),
                    "actor name is required",
                ));
            }
            if actor.role == ActorRole::Operator
                && (actor.license_number.is_none() || actor.license_type.is_none())
            {
                findings.push(Finding::warning(
                    "CP-ACT-004",
                    format!("actors[{i}].license_number"),
                    "operator license number and type are recommended",
                ));
            }
        }
    }

    /// Stage 6: cross-field coherence.
    fn check_coherence(&self, draft: &DocumentDraft, findings: &mut Vec<Finding>) {
        let total = draft.total_goods_weight_kg();
        let capacity = draft.transport_unit.gross_weight_kg;
        if capacity > 0 && total > capacity {
            findings.push(Finding::blocking(
                "CP-XFD-001",
                "goods[].weight_kg, transport_unit.gross_weight_kg",
                format!(
                    "total goods weight {total} kg exceeds gross vehicle weight {capacity} kg"
                ),
            ));
        }

        if !draft.international && draft.total_distance_km() == 0 {
            findings.push(Finding::blocking(
                "CP-XFD-002",
                "locations[].distance_km",
                "domestic transport requires a total distance greater than zero",
            ));
        }

        let has_foreign = draft.has_foreign_location();
        if draft.international && !has_foreign {
            findings.push(Finding::blocking(
                "CP-XFD-003",
                "international, locations[].country_code",
                "document is flagged international but every location is domestic",
            ));
        }
        if !draft.international && has_foreign {
            findings.push(Finding::blocking(
                "CP-XFD-003",
                "international, locations[].country_code",
                "document has a foreign location but is not flagged international",
            ));
        }
    }

    /// Check a code against a catalog: unknown code is blocking, an
    /// unconsultable catalog is a warning.
    async fn require_known_code(
        &self,
        findings: &mut Vec<Finding>,
        kind: CatalogKind,
        code: &str,
        field: String,
        rule: &'static str,
    ) {
        match self.catalog.exists(kind, code).await {
            Ok(true) => {}
            Ok(false) => findings.push(Finding::blocking(
                rule,
                field,
                format!("code {code:?} is not in catalog {kind}"),
            )),
            Err(e) => {
                tracing::warn!(catalog = %kind, code, error = %e, "catalog lookup failed");
                findings.push(Finding::warning(
                    "CP-CAT-001",
                    field,
                    format!("could not verify code {code:?} against {kind}: {e}"),
                ));
            }
        }
    }
}

/// Loose plate shape check: 5 to 8 alphanumeric characters once separators
/// are stripped. State formats vary; this only catches obvious garbage.
fn plate_looks_valid(plate: &str) -> bool {
    let stripped: String = plate
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    (5..=8).contains(&stripped.chars().count())
        && stripped.chars().all(|c| c.is_ascii_alphanumeric())
}
