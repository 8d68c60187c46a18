//! # porteo-pac — Certification Provider Client
//!
//! Client for the authorized certification provider (PAC) that stamps
//! canonical transport documents with the tax authority. Covers stamping,
//! cancellation, the rejection-code taxonomy, and retry policy.
//!
//! ## Architecture
//!
//! The [`PacAdapter`] trait is the seam: production code uses
//! [`HttpPacAdapter`] against the provider's REST API, tests use
//! [`MockPacAdapter`] with scripted outcomes. Adapters are `Send + Sync`
//! and shared via `Arc` across async tasks.
//!
//! ## Error discipline
//!
//! A provider *rejection* is not an error. Rejections are domain outcomes
//! ([`StampOutcome::Rejected`]) carrying the provider's code, classified
//! into a [`RejectionCategory`] and a [`RejectionSeverity`]. [`PacError`]
//! is reserved for transport and protocol failures where no verdict was
//! obtained.
//!
//! ## Retry
//!
//! Transport failures retry with exponential backoff inside the HTTP
//! adapter (see `retry`). Rejections never retry: the provider has ruled.

pub mod adapter;
pub mod config;
pub mod http;
pub mod mock;
pub mod rejection;
pub mod retry;

pub use adapter::{
    CancelOutcome, CancelRequest, CertificationRecord, PacAdapter, PacError, Rejection,
    StampOutcome, StampRequest,
};
pub use config::{ConfigError, PacConfig, PacEnvironment};
pub use http::HttpPacAdapter;
pub use mock::MockPacAdapter;
pub use rejection::{classify_rejection, RejectionCategory, RejectionSeverity};
pub use retry::RetryPolicy;
