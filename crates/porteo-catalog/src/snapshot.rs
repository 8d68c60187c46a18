//! # Snapshot Catalog — In-Memory Dataset with Swap Refresh
//!
//! Holds each catalog as an ordered map under an `RwLock<Arc<...>>`. A
//! refresh builds the new dataset off to the side and swaps the `Arc`, so
//! readers never observe a half-loaded catalog and never block on a refresh
//! in progress.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use porteo_core::Timestamp;

use crate::store::{CatalogEntry, CatalogError, CatalogKind, CatalogStore};

type Dataset = BTreeMap<CatalogKind, BTreeMap<String, String>>;

/// In-memory catalog snapshot.
///
/// The default construction via [`SnapshotCatalog::with_builtin_data`] seeds
/// the code subsets bundled with the crate, enough for validation in tests
/// and offline deployments. Production deployments replace the snapshot from
/// the catalog distribution service on a refresh schedule.
pub struct SnapshotCatalog {
    inner: RwLock<Arc<Dataset>>,
    loaded_at: RwLock<Timestamp>,
}

impl SnapshotCatalog {
    /// An empty catalog with no datasets loaded. Every lookup returns
    /// [`CatalogError::NotLoaded`].
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Arc::new(BTreeMap::new())),
            loaded_at: RwLock::new(Timestamp::now()),
        }
    }

    /// A catalog seeded with the bundled code subsets.
    pub fn with_builtin_data() -> Self {
        let catalog = Self::empty();
        catalog.replace_snapshot(builtin_dataset());
        catalog
    }

    /// Replace the entire dataset atomically. Readers holding the previous
    /// `Arc` finish their lookup against the old snapshot.
    pub fn replace_snapshot(&self, dataset: Dataset) {
        let entries: usize = dataset.values().map(|m| m.len()).sum();
        *self.inner.write() = Arc::new(dataset);
        *self.loaded_at.write() = Timestamp::now();
        tracing::info!(entries, "catalog snapshot replaced");
    }

    /// Load one catalog's rows into the current dataset.
    pub fn load(&self, kind: CatalogKind, rows: impl IntoIterator<Item = (String, String)>) {
        let mut guard = self.inner.write();
        let mut dataset = (**guard).clone();
        dataset.entry(kind).or_default().extend(rows);
        *guard = Arc::new(dataset);
    }

    /// When the current snapshot was installed.
    pub fn loaded_at(&self) -> Timestamp {
        *self.loaded_at.read()
    }

    fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.inner.read())
    }
}

#[async_trait::async_trait]
impl CatalogStore for SnapshotCatalog {
    async fn exists(&self, kind: CatalogKind, code: &str) -> Result<bool, CatalogError> {
        let dataset = self.dataset();
        let table = dataset.get(&kind).ok_or(CatalogError::NotLoaded { kind })?;
        Ok(table.contains_key(code))
    }

    async fn search(
        &self,
        kind: CatalogKind,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let dataset = self.dataset();
        let table = dataset.get(&kind).ok_or(CatalogError::NotLoaded { kind })?;
        Ok(table
            .range(prefix.to_string()..)
            .take_while(|(code, _)| code.starts_with(prefix))
            .take(limit)
            .map(|(code, description)| CatalogEntry {
                code: code.clone(),
                description: description.clone(),
            })
            .collect())
    }
}

/// Bundled subsets of the SAT catalogs.
///
/// These are the codes exercised by tests and the offline CLI. They are a
/// strict subset of the published catalogs, never a substitute for a refresh
/// against the full distribution.
fn builtin_dataset() -> Dataset {
    let mut dataset: Dataset = BTreeMap::new();

    let postal = [
        ("01000", "Álvaro Obregón, CDMX"),
        ("06600", "Cuauhtémoc, CDMX"),
        ("44100", "Guadalajara Centro, JAL"),
        ("64000", "Monterrey Centro, NL"),
        ("76000", "Querétaro Centro, QUE"),
        ("97000", "Mérida Centro, YUC"),
    ];
    let products = [
        ("10101500", "Animales vivos de granja"),
        ("24101500", "Cajas de cartón"),
        ("50202306", "Agua purificada"),
        ("78101800", "Transporte de carga por carretera"),
    ];
    let units = [
        ("H87", "Pieza"),
        ("KGM", "Kilogramo"),
        ("LTR", "Litro"),
        ("TNE", "Tonelada"),
        ("XBX", "Caja"),
    ];
    let vehicles = [
        ("C2", "Camión unitario de 2 ejes"),
        ("C3", "Camión unitario de 3 ejes"),
        ("T3S2", "Tractocamión articulado, 5 ejes"),
        ("VL", "Vehículo ligero de carga"),
    ];
    let hazmat = [
        ("1203", "Gasolina"),
        ("1428", "Sodio"),
        ("1993", "Líquido inflamable, n.e.p."),
    ];
    let packaging = [
        ("1A1", "Bidón de acero, tapa no desmontable"),
        ("4G", "Caja de cartón"),
        ("3H1", "Jerricán de plástico"),
    ];
    let permits = [
        ("TPAF01", "Autotransporte federal de carga general"),
        ("TPAF02", "Transporte privado de carga"),
        ("TPAF09", "Autotransporte federal de carga especializada"),
    ];
    let countries = [("MEX", "México"), ("USA", "Estados Unidos"), ("GTM", "Guatemala")];

    let load = |dataset: &mut Dataset, kind: CatalogKind, rows: &[(&str, &str)]| {
        dataset.insert(
            kind,
            rows.iter()
                .map(|(c, d)| (c.to_string(), d.to_string()))
                .collect(),
        );
    };

    load(&mut dataset, CatalogKind::PostalCodes, &postal);
    load(&mut dataset, CatalogKind::ProductServiceCodes, &products);
    load(&mut dataset, CatalogKind::UnitCodes, &units);
    load(&mut dataset, CatalogKind::VehicleConfigs, &vehicles);
    load(&mut dataset, CatalogKind::HazmatCodes, &hazmat);
    load(&mut dataset, CatalogKind::PackagingCodes, &packaging);
    load(&mut dataset, CatalogKind::PermitTypes, &permits);
    load(&mut dataset, CatalogKind::Countries, &countries);

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_codes_exist() {
        let catalog = SnapshotCatalog::with_builtin_data();
        assert!(catalog
            .exists(CatalogKind::PostalCodes, "44100")
            .await
            .unwrap());
        assert!(catalog.exists(CatalogKind::UnitCodes, "XBX").await.unwrap());
        assert!(!catalog
            .exists(CatalogKind::PostalCodes, "99999")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn empty_catalog_reports_not_loaded() {
        let catalog = SnapshotCatalog::empty();
        match catalog.exists(CatalogKind::PostalCodes, "44100").await {
            Err(CatalogError::NotLoaded { kind }) => {
                assert_eq!(kind, CatalogKind::PostalCodes);
            }
            other => panic!("expected NotLoaded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_respects_prefix_and_limit() {
        let catalog = SnapshotCatalog::with_builtin_data();
        let hits = catalog
            .search(CatalogKind::PermitTypes, "TPAF", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|e| e.code.starts_with("TPAF")));
        // BTreeMap range guarantees code order.
        assert!(hits[0].code < hits[1].code);
    }

    #[tokio::test]
    async fn replace_snapshot_swaps_contents() {
        let catalog = SnapshotCatalog::with_builtin_data();
        let mut dataset: Dataset = BTreeMap::new();
        dataset.insert(
            CatalogKind::PostalCodes,
            [("11111".to_string(), "Prueba".to_string())].into(),
        );
        catalog.replace_snapshot(dataset);

        assert!(catalog
            .exists(CatalogKind::PostalCodes, "11111")
            .await
            .unwrap());
        assert!(!catalog
            .exists(CatalogKind::PostalCodes, "44100")
            .await
            .unwrap());
        // Other catalogs are gone with the old snapshot.
        assert!(catalog.exists(CatalogKind::UnitCodes, "XBX").await.is_err());
    }

    #[tokio::test]
    async fn load_extends_single_catalog() {
        let catalog = SnapshotCatalog::empty();
        catalog.load(
            CatalogKind::Countries,
            [("BLZ".to_string(), "Belice".to_string())],
        );
        assert!(catalog.exists(CatalogKind::Countries, "BLZ").await.unwrap());
    }
}
