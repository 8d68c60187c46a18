//! # Certification Pipeline
//!
//! Sequences the four stages: `validate → generate → ledger.consume →
//! certify`. Each stage either advances the document's milestone or fails
//! and leaves the document in its last successfully-reached state.
//!
//! ## Stage-failure isolation
//!
//! - Validation and generation are pure over the draft and freely
//!   re-runnable.
//! - Ledger consumption is recorded against the artifact's content digest
//!   before the authority is called, so a retried certification for the
//!   same bytes skips the ledger instead of debiting twice. The ledger
//!   itself also no-ops on a digest it already charged, which covers the
//!   case where a competing writer clobbers the payment record between
//!   the debit and its save.
//! - Certification retries at the transport level live inside the PAC
//!   adapter; the pipeline never resubmits on its own.
//!
//! A store revision conflict anywhere in the run is retried transparently
//! once from the freshly loaded state.

use std::sync::Arc;

use thiserror::Error;

use porteo_artifact::{CanonicalArtifact, GenerateError, Generator};
use porteo_core::{DocumentDraft, DocumentId};
use porteo_ledger::{CreditLedger, LedgerError};
use porteo_pac::{
    CancelRequest, PacAdapter, PacError, Rejection, StampOutcome, StampRequest,
};
use porteo_validation::{ValidationEngine, ValidationError, ValidationResult};

use crate::state::{CancelReason, DocumentRecord, DocumentState, LifecycleError};
use crate::store::DocumentStore;

/// Units debited per certification.
pub const CERTIFICATION_COST: u64 = 1;

/// Errors surfaced by pipeline operations. Each maps to the stage that
/// failed; the document remains in its prior state.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Lifecycle or persistence failure.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Validation could not run (canonicalization failure, not findings).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Validation ran and found blocking problems.
    #[error("draft is not certifiable: {blocking} blocking finding(s), score {score}")]
    NotCertifiable {
        /// Blocking finding count.
        blocking: usize,
        /// Compliance score of the failed validation.
        score: u32,
    },

    /// Artifact generation failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Credit consumption failed; the authority was never called.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No verdict was obtained from the provider.
    #[error(transparent)]
    Authority(#[from] PacError),

    /// The provider refused to stamp the document.
    #[error("provider rejected the document: [{}] {}", .0.code, .0.description)]
    Rejected(Rejection),

    /// The authority refused to cancel a stamped document.
    #[error("cancellation refused: [{code}] {description}")]
    CancelRefused { code: String, description: String },

    /// Stored record claims `Certified` but carries no certification.
    #[error("document {0} is certified but carries no certification record")]
    MissingCertification(DocumentId),

    /// Canonical bytes did not re-parse into a stamping payload.
    #[error("canonical payload unreadable: {reason}")]
    Payload { reason: String },
}

/// The pipeline orchestrator.
pub struct Pipeline {
    engine: ValidationEngine,
    generator: Generator,
    ledger: Arc<CreditLedger>,
    pac: Arc<dyn PacAdapter>,
    store: Arc<dyn DocumentStore>,
}

impl Pipeline {
    /// Assemble a pipeline over its collaborators.
    pub fn new(
        engine: ValidationEngine,
        generator: Generator,
        ledger: Arc<CreditLedger>,
        pac: Arc<dyn PacAdapter>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            engine,
            generator,
            ledger,
            pac,
            store,
        }
    }

    /// Access the document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Register a new draft document.
    pub fn create_draft(&self, draft: DocumentDraft) -> Result<DocumentRecord, PipelineError> {
        let record = DocumentRecord::new_draft(draft);
        self.store.insert(record.clone())?;
        tracing::info!(document = %record.id, "draft created");
        Ok(record)
    }

    /// Persist edited draft content. Never advances lifecycle state.
    pub fn save_draft(&self, draft: DocumentDraft) -> Result<DocumentRecord, PipelineError> {
        let mut record = self.store.load(draft.id)?;
        record.save_draft(draft)?;
        Ok(self.store.save(record)?)
    }

    /// Run validation and record the result. Advances `Draft → Validated`
    /// when the draft is certifiable; a failing validation changes nothing
    /// but still returns its findings.
    pub async fn validate(&self, id: DocumentId) -> Result<ValidationResult, PipelineError> {
        let mut record = self.store.load(id)?;
        let validation = self.engine.validate(&record.draft).await?;

        record.validation = Some(validation.clone());
        if validation.is_certifiable() {
            record.advance_to(DocumentState::Validated, "validation passed")?;
        }
        self.store.save(record)?;
        Ok(validation)
    }

    /// Validate and generate the canonical artifact. Advances to
    /// `Generated`; the artifact is appended as the latest canonical
    /// version for the document.
    pub async fn generate(&self, id: DocumentId) -> Result<CanonicalArtifact, PipelineError> {
        let mut record = self.store.load(id)?;
        let validation = self.certifiable_validation(&record.draft).await?;

        let artifact = self.generator.generate(&record.draft, &validation)?;
        record.validation = Some(validation);
        record.advance_to(DocumentState::Validated, "validation passed")?;
        record.advance_to(DocumentState::Generated, "canonical artifact generated")?;
        self.store.save(record)?;
        Ok(artifact)
    }

    /// Run the full pipeline to a stamped document.
    ///
    /// Idempotent over success: certifying an already-certified document
    /// returns the recorded proof. A revision conflict is retried once from
    /// the current state; everything else surfaces as the failing stage's
    /// error with the document parked at its last milestone.
    pub async fn certify(
        &self,
        id: DocumentId,
    ) -> Result<porteo_pac::CertificationRecord, PipelineError> {
        match self.certify_attempt(id).await {
            Err(PipelineError::Lifecycle(LifecycleError::Conflict { .. })) => {
                tracing::warn!(document = %id, "revision conflict during certification, retrying once");
                self.certify_attempt(id).await
            }
            other => other,
        }
    }

    /// Cancel a document. Drafts are discarded locally; certified documents
    /// go through the authority's cancellation with the given reason.
    pub async fn cancel(
        &self,
        id: DocumentId,
        reason: CancelReason,
    ) -> Result<DocumentRecord, PipelineError> {
        let mut record = self.store.load(id)?;
        match record.state {
            DocumentState::Draft => {
                record.discard(reason)?;
                tracing::info!(document = %id, "draft discarded");
                Ok(self.store.save(record)?)
            }
            DocumentState::Certified => {
                let certification = record
                    .certification
                    .clone()
                    .ok_or(PipelineError::MissingCertification(id))?;
                let outcome = self
                    .pac
                    .cancel(&CancelRequest {
                        uuid_fiscal: certification.uuid_fiscal,
                        reason_code: reason.code().to_string(),
                        replacement: reason.replacement(),
                    })
                    .await?;
                match outcome {
                    porteo_pac::CancelOutcome::Accepted { cancelled_at } => {
                        record.cancel_certified(reason, cancelled_at)?;
                        tracing::info!(document = %id, uuid_fiscal = %certification.uuid_fiscal, "document cancelled");
                        Ok(self.store.save(record)?)
                    }
                    porteo_pac::CancelOutcome::Refused { code, description } => {
                        Err(PipelineError::CancelRefused { code, description })
                    }
                }
            }
            other => Err(PipelineError::Lifecycle(LifecycleError::InvalidTransition {
                from: other.to_string(),
                to: DocumentState::Cancelled.to_string(),
            })),
        }
    }

    async fn certify_attempt(
        &self,
        id: DocumentId,
    ) -> Result<porteo_pac::CertificationRecord, PipelineError> {
        let mut record = self.store.load(id)?;
        if record.state == DocumentState::Certified {
            return record
                .certification
                .clone()
                .ok_or(PipelineError::MissingCertification(id));
        }
        if record.state.is_terminal() {
            return Err(PipelineError::Lifecycle(LifecycleError::TerminalState {
                state: record.state.to_string(),
            }));
        }

        // Stage 1: validation.
        let validation = self.certifiable_validation(&record.draft).await?;
        record.validation = Some(validation.clone());
        record.advance_to(DocumentState::Validated, "validation passed")?;

        // Stage 2: generation.
        let artifact = self.generator.generate(&record.draft, &validation)?;
        record.advance_to(DocumentState::Generated, "canonical artifact generated")?;
        record = self.store.save(record)?;

        // Stage 3: credit consumption, skipped when these exact bytes were
        // already paid for by an earlier attempt that failed downstream.
        if record.paid_digest != Some(artifact.content_digest) {
            self.ledger
                .consume(record.account, CERTIFICATION_COST, id, artifact.content_digest)?;
            record.paid_digest = Some(artifact.content_digest);
            record = self.store.save(record)?;
        }

        // Stage 4: certification.
        let payload: serde_json::Value = serde_json::from_slice(artifact.bytes.as_bytes())
            .map_err(|e| PipelineError::Payload {
                reason: e.to_string(),
            })?;
        let outcome = self
            .pac
            .stamp(&StampRequest {
                document: id,
                content_digest: artifact.content_digest,
                canonical_payload: payload,
            })
            .await?;

        match outcome {
            StampOutcome::Stamped(certification) => {
                record.certification = Some(certification.clone());
                record.advance_to(DocumentState::Certified, "stamped by authority")?;
                self.store.save(record)?;
                tracing::info!(
                    document = %id,
                    uuid_fiscal = %certification.uuid_fiscal,
                    "document certified"
                );
                Ok(certification)
            }
            StampOutcome::Rejected(rejection) => {
                tracing::warn!(
                    document = %id,
                    code = %rejection.code,
                    category = ?rejection.category,
                    "certification rejected"
                );
                Err(PipelineError::Rejected(rejection))
            }
        }
    }

    async fn certifiable_validation(
        &self,
        draft: &DocumentDraft,
    ) -> Result<ValidationResult, PipelineError> {
        let validation = self.engine.validate(draft).await?;
        if !validation.is_certifiable() {
            return Err(PipelineError::NotCertifiable {
                blocking: validation.blocking_count(),
                score: validation.score,
            });
        }
        Ok(validation)
    }
}
