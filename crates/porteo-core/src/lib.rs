//! # porteo-core — Foundational Types for the Porteo Stack
//!
//! Shared primitives used by every crate in the workspace:
//!
//! - **Canonical serialization** (`canonical.rs`): `CanonicalBytes`, the sole
//!   construction path for bytes used in digest computation and in the
//!   canonical artifact emitted to the certification authority.
//! - **Content digests** (`digest.rs`): `ContentDigest`, SHA-256 over
//!   canonical bytes. Keys the validation cache and identifies artifact
//!   content across submissions.
//! - **Temporal types** (`temporal.rs`): `Timestamp`, UTC-only and truncated
//!   to seconds so the same instant always canonicalizes to the same bytes.
//! - **Identifier newtypes** (`identity.rs`): `DocumentId`, `AccountId`,
//!   `ArtifactId` (UUID-backed) and `Rfc`, the SAT taxpayer identifier with
//!   format validation at construction.
//! - **Domain model** (`domain.rs`): `DocumentDraft` and its parts, the
//!   mutable transport-document representation the pipeline operates on.
//!
//! This crate holds no business rules. Validation, serialization gating,
//! ledger arithmetic, and lifecycle sequencing live in the crates that own
//! those concerns.

pub mod canonical;
pub mod digest;
pub mod domain;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use domain::{
    ActorRole, DocumentDraft, DocumentKind, GoodsItem, Location, LocationRole, TransportActor,
    TransportUnit,
};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{AccountId, ArtifactId, DocumentId, Rfc};
pub use temporal::Timestamp;
