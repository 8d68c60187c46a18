//! Provider adapter trait and wire types.
//!
//! The trait separates the pipeline from the transport: the pipeline only
//! sees stamping verdicts, never HTTP.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use porteo_core::{ContentDigest, DocumentId, Timestamp};

use crate::config::PacEnvironment;
use crate::rejection::{classify_rejection, RejectionCategory, RejectionSeverity};

/// A stamping request: the canonical document plus its identity.
///
/// `canonical_payload` is the parsed form of the exact canonical bytes the
/// artifact generator produced. The provider re-serializes and stamps those
/// semantics; `content_digest` lets both sides confirm they are talking
/// about the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampRequest {
    /// The document being certified.
    pub document: DocumentId,
    /// Digest of the canonical bytes being stamped.
    pub content_digest: ContentDigest,
    /// The canonical document tree.
    pub canonical_payload: serde_json::Value,
}

/// Proof of certification returned by the provider on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRecord {
    /// The fiscal folio (UUID) assigned by the tax authority.
    pub uuid_fiscal: Uuid,
    /// Authority digital seal over the stamped document.
    pub seal: String,
    /// The original chain the seal was computed over.
    pub cadena_original: String,
    /// Payload for the verification QR code.
    pub qr_payload: String,
    /// Which provider environment issued the stamp.
    pub environment: PacEnvironment,
    /// When the authority registered the stamp.
    pub stamped_at: Timestamp,
}

/// A provider rejection with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Authority or provider rejection code.
    pub code: String,
    /// Human-readable description from the provider.
    pub description: String,
    /// What kind of problem the code describes.
    pub category: RejectionCategory,
    /// Whether resubmitting the same bytes can succeed.
    pub severity: RejectionSeverity,
}

impl Rejection {
    /// Build a rejection, classifying the code.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        let code = code.into();
        let (category, severity) = classify_rejection(&code);
        Self {
            code,
            description: description.into(),
            category,
            severity,
        }
    }
}

/// The provider's verdict on a stamping request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StampOutcome {
    /// The document was stamped and is now a fiscal event.
    Stamped(CertificationRecord),
    /// The provider or authority refused the document.
    Rejected(Rejection),
}

/// A cancellation request for a previously stamped document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    /// Fiscal folio of the stamped document.
    pub uuid_fiscal: Uuid,
    /// Authority cancellation reason code ("01" through "04").
    pub reason_code: String,
    /// Fiscal folio of the replacement document. Required by the authority
    /// when `reason_code` is "01" (errors with re-issue).
    pub replacement: Option<Uuid>,
}

/// The provider's verdict on a cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The authority registered the cancellation.
    Accepted {
        /// When the cancellation took effect.
        cancelled_at: Timestamp,
    },
    /// The authority refused to cancel.
    Refused {
        /// Authority refusal code.
        code: String,
        /// Human-readable description.
        description: String,
    },
}

/// Transport and protocol failures where no verdict was obtained.
#[derive(Debug, thiserror::Error)]
pub enum PacError {
    /// HTTP transport error after retries were exhausted.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The provider returned a status the protocol does not define.
    #[error("provider {endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {reason}")]
    Deserialization { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl PacError {
    /// Whether the failure is transient: the request may succeed later
    /// without anything changing on our side.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            Self::Deserialization { .. } | Self::Config(_) => false,
        }
    }
}

/// The certification provider seam.
#[async_trait::async_trait]
pub trait PacAdapter: Send + Sync {
    /// Submit canonical bytes for stamping. Returns the provider's verdict;
    /// errors mean no verdict was obtained.
    async fn stamp(&self, request: &StampRequest) -> Result<StampOutcome, PacError>;

    /// Request cancellation of a stamped document.
    async fn cancel(&self, request: &CancelRequest) -> Result<CancelOutcome, PacError>;
}
