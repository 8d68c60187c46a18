//! # Findings and the Validation Result
//!
//! A [`Finding`] is one observation about a draft, tagged with a severity, a
//! stable rule code, and the path of the offending field. The
//! [`ValidationResult`] is the immutable aggregate the rest of the pipeline
//! consumes: certifiability is derived, never stored independently.

use serde::{Deserialize, Serialize};

use porteo_core::{ContentDigest, Timestamp};

/// How strongly a finding affects the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Prevents certification. The draft cannot proceed until fixed.
    Blocking,
    /// Surfaced to the user, does not prevent certification.
    Warning,
    /// Style or completeness recommendation.
    Advisory,
}

impl Severity {
    /// Points deducted from the compliance score per finding.
    pub fn score_penalty(&self) -> u32 {
        match self {
            Self::Blocking => 15,
            Self::Warning => 5,
            Self::Advisory => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Blocking => "BLOCKING",
            Self::Warning => "WARNING",
            Self::Advisory => "ADVISORY",
        };
        f.write_str(s)
    }
}

/// One validation observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Severity of the observation.
    pub severity: Severity,
    /// Path of the offending field, e.g. `locations[1].postal_code`.
    /// Cross-field findings list every involved path, comma separated.
    pub field: String,
    /// Stable rule code, e.g. `CP-LOC-003`. Codes never change meaning;
    /// retired rules retire their code with them.
    pub code: String,
    /// Human-readable description of the finding.
    pub message: String,
}

impl Finding {
    /// Construct a blocking finding.
    pub fn blocking(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Blocking,
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Construct a warning.
    pub fn warning(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Construct an advisory.
    pub fn advisory(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Advisory,
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Immutable outcome of validating one draft revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Digest of the draft content this result applies to.
    pub digest: ContentDigest,
    /// Every finding from every stage, in stage order.
    pub findings: Vec<Finding>,
    /// Deterministic compliance score, 0 to 100.
    pub score: u32,
    /// When the validation ran.
    pub validated_at: Timestamp,
}

impl ValidationResult {
    /// Assemble a result, deriving the score from the findings.
    pub fn new(digest: ContentDigest, findings: Vec<Finding>) -> Self {
        let score = compliance_score(&findings);
        Self {
            digest,
            findings,
            score,
            validated_at: Timestamp::now(),
        }
    }

    /// Whether the draft can proceed to generation: no blocking findings.
    pub fn is_certifiable(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|f| f.severity == Severity::Blocking)
    }

    /// Findings of one severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Count of blocking findings.
    pub fn blocking_count(&self) -> usize {
        self.with_severity(Severity::Blocking).count()
    }
}

/// Start at 100, subtract the per-severity penalty for each finding,
/// floor at 0.
fn compliance_score(findings: &[Finding]) -> u32 {
    let penalty: u32 = findings.iter().map(|f| f.severity.score_penalty()).sum();
    100u32.saturating_sub(penalty)
}
