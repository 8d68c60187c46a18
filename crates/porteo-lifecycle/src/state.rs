//! # Document Lifecycle State Machine
//!
//! Models the life of a transport document from first draft through
//! certification or cancellation.
//!
//! ## States
//!
//! ```text
//! Draft ──▶ Validated ──▶ Generated ──▶ Certified ──▶ Cancelled (terminal)
//!   │                                                     ▲
//!   └──▶ Cancelled (discard, no side effects) ────────────┘
//! ```
//!
//! Forward progress only: re-running an already-passed stage never moves a
//! document backwards. A failed stage leaves the document in its last
//! successfully-reached state, so every step is safely retriable.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use porteo_core::{AccountId, ContentDigest, DocumentDraft, DocumentId, Timestamp};
use porteo_pac::CertificationRecord;
use porteo_validation::ValidationResult;

// ─── Document State ──────────────────────────────────────────────────

/// The lifecycle state of a transport document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentState {
    /// Editable content, no fiscal standing.
    Draft,
    /// Passed validation with zero blocking findings.
    Validated,
    /// Canonical artifact produced and persisted.
    Generated,
    /// Stamped by the authority; a legal fiscal event.
    Certified,
    /// Cancelled (terminal): discarded draft or authority-cancelled stamp.
    Cancelled,
}

impl DocumentState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Pipeline progress order. `Cancelled` has no rank; it is reached only
    /// through the cancel operations.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Draft => Some(0),
            Self::Validated => Some(1),
            Self::Generated => Some(2),
            Self::Certified => Some(3),
            Self::Cancelled => None,
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Validated => "VALIDATED",
            Self::Generated => "GENERATED",
            Self::Certified => "CERTIFIED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// ─── Cancellation ────────────────────────────────────────────────────

/// Authority cancellation reason for a certified document.
///
/// Reason codes follow the authority's cancellation catalog; errors with
/// re-issue must name the replacement stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CancelReason {
    /// The document had errors and a corrected replacement was stamped.
    ErrorsWithReissue {
        /// Fiscal folio of the replacement document.
        replacement: Uuid,
    },
    /// The document had errors and no replacement will be issued.
    ErrorsNoReissue,
    /// The transport operation never took place.
    NotCarriedOut,
    /// A global document is being converted to a nominative one.
    GlobalToNominative,
}

impl CancelReason {
    /// Authority reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ErrorsWithReissue { .. } => "01",
            Self::ErrorsNoReissue => "02",
            Self::NotCarriedOut => "03",
            Self::GlobalToNominative => "04",
        }
    }

    /// Replacement stamp, when the reason requires one.
    pub fn replacement(&self) -> Option<Uuid> {
        match self {
            Self::ErrorsWithReissue { replacement } => Some(*replacement),
            _ => None,
        }
    }
}

/// Record of an accepted cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    /// Why the document was cancelled.
    pub reason: CancelReason,
    /// When the cancellation took effect. `None` for discarded drafts,
    /// which never existed fiscally.
    pub cancelled_at: Option<Timestamp>,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from lifecycle transitions and document persistence.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid document transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// Document is in a terminal state.
    #[error("document is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: String,
    },

    /// No document with this identity in the store.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// A document with this identity already exists.
    #[error("document {0} already exists")]
    AlreadyExists(DocumentId),

    /// The write carried a stale revision. Reload and retry from the
    /// current state.
    #[error("revision conflict on {document}: expected {expected}, store has {actual}")]
    Conflict {
        document: DocumentId,
        expected: u64,
        actual: u64,
    },

    /// Content writes are only allowed while the document is a draft.
    #[error("content can only be saved in DRAFT state, document is {state}")]
    DraftOnly {
        /// The document's current state.
        state: String,
    },
}

// ─── Transition history ──────────────────────────────────────────────

/// Record of a document state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: DocumentState,
    /// State after the transition.
    pub to_state: DocumentState,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Reason for the transition.
    pub reason: String,
}

// ─── Document record ─────────────────────────────────────────────────

/// A document with its content, lifecycle state, and pipeline bookkeeping.
///
/// `revision` is the optimistic-concurrency token: every store write
/// carries the revision it was loaded at, and the store rejects writes
/// whose revision is stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identity.
    pub id: DocumentId,
    /// Owning account, charged for certification.
    pub account: AccountId,
    /// Current draft content.
    pub draft: DocumentDraft,
    /// Current lifecycle state.
    pub state: DocumentState,
    /// Store revision this record was loaded at.
    pub revision: u64,
    /// When the document was created.
    pub created_at: Timestamp,
    /// Last validation run, if any. Cleared on content edits.
    pub validation: Option<ValidationResult>,
    /// Content digest the account has already paid certification for.
    /// Lets a retried certification skip the ledger after a provider
    /// failure, avoiding a double debit for the same bytes.
    pub paid_digest: Option<ContentDigest>,
    /// Authority proof, present from `Certified` on.
    pub certification: Option<CertificationRecord>,
    /// Cancellation record, present in `Cancelled`.
    pub cancellation: Option<CancellationRecord>,
    /// Ordered log of all state transitions.
    pub transitions: Vec<TransitionRecord>,
}

impl DocumentRecord {
    /// Create a new draft document.
    pub fn new_draft(draft: DocumentDraft) -> Self {
        Self {
            id: draft.id,
            account: draft.account,
            draft,
            state: DocumentState::Draft,
            revision: 0,
            created_at: Timestamp::now(),
            validation: None,
            paid_digest: None,
            certification: None,
            cancellation: None,
            transitions: Vec::new(),
        }
    }

    /// Advance along the pipeline order. A forward-only latch: reaching a
    /// milestone the document already passed is a no-op, so every pipeline
    /// stage can be re-invoked safely.
    pub fn advance_to(&mut self, to: DocumentState, reason: &str) -> Result<(), LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::TerminalState {
                state: self.state.to_string(),
            });
        }
        let (from_rank, to_rank) = match (self.state.rank(), to.rank()) {
            (Some(f), Some(t)) => (f, t),
            _ => {
                return Err(LifecycleError::InvalidTransition {
                    from: self.state.to_string(),
                    to: to.to_string(),
                })
            }
        };
        if to_rank > from_rank {
            self.do_transition(to, reason);
        }
        Ok(())
    }

    /// Cancel a certified document (CERTIFIED → CANCELLED).
    ///
    /// The caller must already hold the authority's acceptance; this only
    /// records it.
    pub fn cancel_certified(
        &mut self,
        reason: CancelReason,
        cancelled_at: Timestamp,
    ) -> Result<(), LifecycleError> {
        if self.state != DocumentState::Certified {
            return Err(LifecycleError::InvalidTransition {
                from: self.state.to_string(),
                to: DocumentState::Cancelled.to_string(),
            });
        }
        self.cancellation = Some(CancellationRecord {
            reason: reason.clone(),
            cancelled_at: Some(cancelled_at),
        });
        self.do_transition(DocumentState::Cancelled, reason.code());
        Ok(())
    }

    /// Discard a draft (DRAFT → CANCELLED). No fiscal side effects.
    pub fn discard(&mut self, reason: CancelReason) -> Result<(), LifecycleError> {
        if self.state != DocumentState::Draft {
            return Err(LifecycleError::InvalidTransition {
                from: self.state.to_string(),
                to: DocumentState::Cancelled.to_string(),
            });
        }
        self.cancellation = Some(CancellationRecord {
            reason,
            cancelled_at: None,
        });
        self.do_transition(DocumentState::Cancelled, "draft discarded");
        Ok(())
    }

    /// Replace draft content. Never advances state: editing a `Validated`
    /// or `Generated` document sends it back to `Draft`, because the
    /// milestones no longer describe the new content. Certified and
    /// cancelled documents are immutable.
    pub fn save_draft(&mut self, draft: DocumentDraft) -> Result<(), LifecycleError> {
        match self.state {
            DocumentState::Draft => {}
            DocumentState::Validated | DocumentState::Generated => {
                self.do_transition(DocumentState::Draft, "content edited");
            }
            DocumentState::Certified | DocumentState::Cancelled => {
                return Err(LifecycleError::DraftOnly {
                    state: self.state.to_string(),
                });
            }
        }
        self.draft = draft;
        self.validation = None;
        Ok(())
    }

    fn do_transition(&mut self, to: DocumentState, reason: &str) {
        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: Timestamp::now(),
            reason: reason.to_string(),
        });
        self.state = to;
    }
}
