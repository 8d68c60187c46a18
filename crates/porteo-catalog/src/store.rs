//! # Catalog Store Trait and Shared Types
//!
//! The lookup contract every catalog backend implements, plus the catalog
//! taxonomy and error type shared by the snapshot and HTTP backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The SAT catalogs the validation engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// c_CodigoPostal: postal codes.
    PostalCodes,
    /// c_ClaveProdServCP: product/service codes admitted on a Carta Porte.
    ProductServiceCodes,
    /// c_ClaveUnidad: unit of measure codes.
    UnitCodes,
    /// c_ConfigAutotransporte: vehicle configuration codes.
    VehicleConfigs,
    /// c_MaterialPeligroso: hazardous-material codes.
    HazmatCodes,
    /// c_TipoEmbalaje: packaging type codes.
    PackagingCodes,
    /// c_TipoPermiso: SCT permit type codes.
    PermitTypes,
    /// c_Pais: country codes.
    Countries,
}

impl CatalogKind {
    /// Catalog identifier string, matching the SAT catalog file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostalCodes => "c_CodigoPostal",
            Self::ProductServiceCodes => "c_ClaveProdServCP",
            Self::UnitCodes => "c_ClaveUnidad",
            Self::VehicleConfigs => "c_ConfigAutotransporte",
            Self::HazmatCodes => "c_MaterialPeligroso",
            Self::PackagingCodes => "c_TipoEmbalaje",
            Self::PermitTypes => "c_TipoPermiso",
            Self::Countries => "c_Pais",
        }
    }

    /// All catalog kinds.
    pub fn all() -> &'static [CatalogKind] {
        &[
            Self::PostalCodes,
            Self::ProductServiceCodes,
            Self::UnitCodes,
            Self::VehicleConfigs,
            Self::HazmatCodes,
            Self::PackagingCodes,
            Self::PermitTypes,
            Self::Countries,
        ]
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog row: a code and its human description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The controlled code value.
    pub code: String,
    /// Human-readable description from the catalog.
    pub description: String,
}

/// Errors from catalog lookups.
///
/// `Unavailable` and `Timeout` mean the catalog could not be consulted, not
/// that the code is absent. Callers must not treat them as a missing code.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend has no dataset loaded for this catalog.
    #[error("catalog {kind} is not loaded")]
    NotLoaded {
        /// The catalog that was requested.
        kind: CatalogKind,
    },

    /// The catalog backend is unreachable or returned an error.
    #[error("catalog {kind} unavailable: {reason}")]
    Unavailable {
        /// The catalog that was requested.
        kind: CatalogKind,
        /// Transport or backend failure description.
        reason: String,
    },

    /// The lookup exceeded its time budget.
    #[error("catalog {kind} lookup timed out after {elapsed_ms}ms")]
    Timeout {
        /// The catalog that was requested.
        kind: CatalogKind,
        /// Elapsed milliseconds before the timeout fired.
        elapsed_ms: u64,
    },
}

/// Read-only catalog lookups.
///
/// Implementations must be cheap to share (`Arc`) and safe to call
/// concurrently. Lookups may perform network I/O and must bound their own
/// latency so a slow catalog cannot stall validation indefinitely.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Whether `code` exists in the given catalog.
    async fn exists(&self, kind: CatalogKind, code: &str) -> Result<bool, CatalogError>;

    /// Entries whose code starts with `prefix`, up to `limit`, in code order.
    async fn search(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;
}
