//! # porteo-artifact — Canonical Serializer and Versioned Artifact Store
//!
//! Converts a validated draft into the canonical byte representation
//! submitted to the certification authority, and keeps every produced
//! representation as an immutable version.
//!
//! ## Fail-closed self-check
//!
//! `generate()` re-parses its own output and asserts that every mandatory
//! structural node is present and that the emitted counts match the draft.
//! A self-check failure returns an error and persists nothing. Shipping a
//! malformed document to the authority burns a submission and, in the worst
//! case, certifies garbage; refusing to emit is always the cheaper failure.
//!
//! ## Determinism
//!
//! The canonical tree is a pure function of the draft: no emission
//! timestamp, no random identifiers inside the bytes. Re-generating an
//! unchanged draft yields byte-identical output, which is what lets the
//! authority's duplicate-submission detection stand in for an idempotency
//! key during retries.

pub mod generator;
pub mod store;

pub use generator::{
    parse, CanonicalArtifact, CanonicalDocument, GenerateError, Generator, ParseError,
};
pub use store::{ArtifactStore, RepresentationKind, StoredArtifact};
