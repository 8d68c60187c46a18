//! # porteo-catalog — SAT Code Catalog Reference Store
//!
//! Read-only lookups against the government-controlled code lists the
//! validation engine checks drafts against: postal codes, product/service
//! codes, unit codes, vehicle configurations, hazardous-material codes,
//! packaging codes, permit types, and country codes.
//!
//! ## Architecture
//!
//! The [`CatalogStore`] trait abstracts over the backing dataset. Two
//! implementations ship here:
//!
//! - [`SnapshotCatalog`]: an in-memory snapshot, swap-replaced on refresh.
//!   The authoritative catalogs change on the order of months; staleness of
//!   minutes-to-hours is acceptable, so validation reads a snapshot rather
//!   than hitting the network per lookup.
//! - [`HttpCatalog`]: a reqwest-backed remote lookup with a per-request
//!   timeout. Used where the deployment serves catalogs from a shared
//!   service instead of bundling them.
//!
//! ## Failure semantics
//!
//! A lookup distinguishes "code is not in the catalog" (a fact about the
//! draft) from "the catalog could not be consulted" (a fact about the
//! infrastructure). The validation engine turns the former into a blocking
//! finding and the latter into a warning, so a catalog outage never produces
//! a false rejection.

pub mod http;
pub mod snapshot;
pub mod store;

pub use http::{HttpCatalog, HttpCatalogConfig};
pub use snapshot::SnapshotCatalog;
pub use store::{CatalogEntry, CatalogError, CatalogKind, CatalogStore};
