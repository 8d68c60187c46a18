//! # porteo-lifecycle — Document Lifecycle & Pipeline Orchestration
//!
//! Ties the pipeline together: the document state machine, the optimistic
//! document store, the four-stage certification pipeline, and the error
//! categorizer that turns typed failures into presentation-ready guidance.
//!
//! ## Ordering guarantees
//!
//! - Credit is consumed strictly before the authority is called. An account
//!   that cannot pay never reaches the authority.
//! - A certification attempt that fails after the debit records the paid
//!   content digest, so retrying the same bytes never debits twice.
//! - Every stage failure leaves the document in its last
//!   successfully-reached state, and every stage is safely re-invokable.

pub mod categorize;
pub mod pipeline;
pub mod state;
pub mod store;

pub use categorize::{categorize, CategorizedError, ErrorKind};
pub use pipeline::{Pipeline, PipelineError, CERTIFICATION_COST};
pub use state::{
    CancelReason, CancellationRecord, DocumentRecord, DocumentState, LifecycleError,
    TransitionRecord,
};
pub use store::{DocumentStore, InMemoryDocumentStore};
