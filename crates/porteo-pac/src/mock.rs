//! Scriptable in-memory provider for tests.
//!
//! Outcomes are queued ahead of time and dequeued per call, so a test can
//! script "transport failure, then stamped" or "rejected with 601" without
//! a network. Call counts expose retry behavior to assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use uuid::Uuid;

use porteo_core::Timestamp;

use crate::adapter::{
    CancelOutcome, CancelRequest, CertificationRecord, PacAdapter, PacError, StampOutcome,
    StampRequest,
};
use crate::config::PacEnvironment;

/// A queued answer for the next `stamp` call.
pub enum ScriptedStamp {
    /// Return this verdict.
    Outcome(StampOutcome),
    /// Fail with a protocol error (simulates exhausted retries).
    Error(PacError),
}

/// In-memory [`PacAdapter`] with scripted responses.
#[derive(Default)]
pub struct MockPacAdapter {
    stamps: Mutex<VecDeque<ScriptedStamp>>,
    cancels: Mutex<VecDeque<Result<CancelOutcome, PacError>>>,
    stamp_calls: AtomicU32,
    cancel_calls: AtomicU32,
}

impl MockPacAdapter {
    /// An adapter with an empty script. Unscripted calls stamp successfully
    /// with fresh identifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a verdict for the next unanswered `stamp` call.
    pub fn script_stamp(&self, outcome: StampOutcome) -> &Self {
        self.stamps.lock().push_back(ScriptedStamp::Outcome(outcome));
        self
    }

    /// Queue a protocol failure for the next unanswered `stamp` call.
    pub fn script_stamp_error(&self, error: PacError) -> &Self {
        self.stamps.lock().push_back(ScriptedStamp::Error(error));
        self
    }

    /// Queue an answer for the next unanswered `cancel` call.
    pub fn script_cancel(&self, outcome: Result<CancelOutcome, PacError>) -> &Self {
        self.cancels.lock().push_back(outcome);
        self
    }

    /// How many times `stamp` has been called.
    pub fn stamp_calls(&self) -> u32 {
        self.stamp_calls.load(Ordering::SeqCst)
    }

    /// How many times `cancel` has been called.
    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    /// A plausible certification record for happy-path scripting.
    pub fn sample_record() -> CertificationRecord {
        CertificationRecord {
            uuid_fiscal: Uuid::new_v4(),
            seal: "c2VsbG8tZGUtcHJ1ZWJh".to_string(),
            cadena_original: "||1.1|...||".to_string(),
            qr_payload: "https://verificacfdi.facturaelectronica.sat.gob.mx/default.aspx"
                .to_string(),
            environment: PacEnvironment::Test,
            stamped_at: Timestamp::now(),
        }
    }
}

#[async_trait::async_trait]
impl PacAdapter for MockPacAdapter {
    async fn stamp(&self, _request: &StampRequest) -> Result<StampOutcome, PacError> {
        self.stamp_calls.fetch_add(1, Ordering::SeqCst);
        match self.stamps.lock().pop_front() {
            Some(ScriptedStamp::Outcome(outcome)) => Ok(outcome),
            Some(ScriptedStamp::Error(error)) => Err(error),
            None => Ok(StampOutcome::Stamped(Self::sample_record())),
        }
    }

    async fn cancel(&self, _request: &CancelRequest) -> Result<CancelOutcome, PacError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        match self.cancels.lock().pop_front() {
            Some(outcome) => outcome,
            None => Ok(CancelOutcome::Accepted {
                cancelled_at: Timestamp::now(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Rejection;

    #[tokio::test]
    async fn scripted_outcomes_dequeue_in_order() {
        let mock = MockPacAdapter::new();
        mock.script_stamp(StampOutcome::Rejected(Rejection::new("301", "malformed")));
        mock.script_stamp(StampOutcome::Stamped(MockPacAdapter::sample_record()));

        let request = StampRequest {
            document: porteo_core::DocumentId::new(),
            content_digest: porteo_core::ContentDigest([0u8; 32]),
            canonical_payload: serde_json::json!({}),
        };

        assert!(matches!(
            mock.stamp(&request).await.unwrap(),
            StampOutcome::Rejected(_)
        ));
        assert!(matches!(
            mock.stamp(&request).await.unwrap(),
            StampOutcome::Stamped(_)
        ));
        assert_eq!(mock.stamp_calls(), 2);
    }
}
