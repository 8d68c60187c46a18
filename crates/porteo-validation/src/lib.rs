//! # porteo-validation — Staged Validation Engine
//!
//! Runs a transport-document draft through six fixed stages and aggregates
//! every finding into a single [`ValidationResult`]:
//!
//! 1. Identity fields (issuer/recipient RFC format and names)
//! 2. Locations (roles, address completeness, postal-code catalog lookup,
//!    monotonic timestamps)
//! 3. Goods items (codes, positive quantities, hazmat conditionals,
//!    regulated-substance permits)
//! 4. Transport unit (identification, permits, numeric sanity)
//! 5. Transport actors (operator presence, RFC format, license fields)
//! 6. Cross-field coherence (weight capacity, domestic distance,
//!    international flag correlation)
//!
//! ## Doctrine
//!
//! Every stage always runs; nothing short-circuits. A user fixing a draft
//! should see the whole picture in one pass, not discover findings one stage
//! at a time.
//!
//! A catalog outage is reported as a *warning* ("could not verify"), never as
//! a blocking finding: the draft is not wrong just because the catalog
//! service is down.
//!
//! Results are cached by the draft's content digest. Re-validating an
//! unchanged draft is a lookup, not a re-run.

pub mod cache;
pub mod engine;
pub mod finding;
pub mod substances;

pub use cache::ValidationCache;
pub use engine::{ValidationEngine, ValidationError};
pub use finding::{Finding, Severity, ValidationResult};
