//! # Error Categorizer
//!
//! Post-processes any pipeline failure into a presentation-ready category
//! with remediation hints. Pure over the typed error tree; the pipeline
//! itself never consumes this, only the presentation layer does. Raw
//! provider text is preserved as `technical_detail`, never shown as the
//! primary message.

use serde::{Deserialize, Serialize};

use porteo_artifact::GenerateError;
use porteo_ledger::LedgerError;
use porteo_pac::{PacError, RejectionCategory};

use crate::pipeline::PipelineError;
use crate::state::LifecycleError;

/// Coarse failure category, the primary UI discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The document's content needs fixing.
    DataEntry,
    /// The account's fiscal credentials need attention.
    Credential,
    /// Certification credit is exhausted.
    Credit,
    /// A service could not be reached; trying again later may work.
    Connectivity,
    /// The document was already stamped.
    Duplicate,
    /// Someone else edited the document at the same time.
    Conflict,
    /// Provider-side failure outside the user's control.
    Provider,
    /// Unexpected internal failure.
    Internal,
}

/// A categorized failure, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedError {
    /// Coarse category.
    pub kind: ErrorKind,
    /// Short headline.
    pub title: String,
    /// One-paragraph explanation in user terms.
    pub message: String,
    /// Whether the user can fix this themselves.
    pub user_actionable: bool,
    /// Concrete next steps, most useful first.
    pub suggested_actions: Vec<String>,
    /// Raw underlying error text, for support tickets and logs.
    pub technical_detail: String,
}

/// Categorize a pipeline failure.
pub fn categorize(error: &PipelineError) -> CategorizedError {
    let technical_detail = error.to_string();
    match error {
        PipelineError::NotCertifiable { blocking, .. } => CategorizedError {
            kind: ErrorKind::DataEntry,
            title: "The document has blocking issues".to_string(),
            message: format!(
                "Validation found {blocking} issue(s) that must be fixed before this \
                 document can be certified."
            ),
            user_actionable: true,
            suggested_actions: vec![
                "Open the validation findings and fix each blocking issue".to_string(),
                "Run validation again to confirm the document is clean".to_string(),
            ],
            technical_detail,
        },

        PipelineError::Rejected(rejection) => match rejection.category {
            RejectionCategory::FieldValidation => CategorizedError {
                kind: ErrorKind::DataEntry,
                title: "The authority rejected the document".to_string(),
                message: "The tax authority found a problem with the document's content. \
                          Review the flagged fields and correct them."
                    .to_string(),
                user_actionable: true,
                suggested_actions: vec![
                    "Review the rejection detail below and correct the draft".to_string(),
                    "Validate and certify again after editing".to_string(),
                ],
                technical_detail,
            },
            RejectionCategory::Credential => CategorizedError {
                kind: ErrorKind::Credential,
                title: "There is a problem with your fiscal certificate".to_string(),
                message: "The authority could not verify the signing certificate for this \
                          account. The document itself is fine."
                    .to_string(),
                user_actionable: true,
                suggested_actions: vec![
                    "Check that your certificate is current and not revoked".to_string(),
                    "Upload a renewed certificate and try again".to_string(),
                ],
                technical_detail,
            },
            RejectionCategory::Quota => CategorizedError {
                kind: ErrorKind::Credit,
                title: "Stamping quota exhausted".to_string(),
                message: "The certification provider reports this account's stamping quota \
                          is used up."
                    .to_string(),
                user_actionable: true,
                suggested_actions: vec![
                    "Purchase additional certification credit".to_string(),
                    "Wait for your plan cycle to renew".to_string(),
                ],
                technical_detail,
            },
            RejectionCategory::Duplicate => CategorizedError {
                kind: ErrorKind::Duplicate,
                title: "This document was already certified".to_string(),
                message: "An identical document already carries a stamp. No new stamp was \
                          issued and no additional credit was consumed."
                    .to_string(),
                user_actionable: true,
                suggested_actions: vec![
                    "Refresh the document to load its existing certification".to_string(),
                ],
                technical_detail,
            },
            RejectionCategory::ProviderInternal => CategorizedError {
                kind: ErrorKind::Provider,
                title: "The certification provider had an internal problem".to_string(),
                message: "Nothing is wrong with your document. The provider failed on \
                          their side; trying again later usually works."
                    .to_string(),
                user_actionable: true,
                suggested_actions: vec!["Try certifying again in a few minutes".to_string()],
                technical_detail,
            },
        },

        PipelineError::Authority(pac) => {
            if pac.is_transient() {
                CategorizedError {
                    kind: ErrorKind::Connectivity,
                    title: "Could not reach the certification provider".to_string(),
                    message: "The provider did not answer in time. Your document is intact \
                              and no stamp was issued; certifying again is safe."
                        .to_string(),
                    user_actionable: true,
                    suggested_actions: vec![
                        "Check your connection and try again".to_string(),
                        "If this keeps happening, the provider may be down".to_string(),
                    ],
                    technical_detail,
                }
            } else {
                CategorizedError {
                    kind: ErrorKind::Provider,
                    title: "Unexpected answer from the certification provider".to_string(),
                    message: "The provider answered in a way this system does not \
                              understand. Support has the technical detail."
                        .to_string(),
                    user_actionable: false,
                    suggested_actions: vec!["Contact support with this error".to_string()],
                    technical_detail,
                }
            }
        }

        PipelineError::Ledger(LedgerError::InsufficientBalance {
            requested,
            available,
        }) => CategorizedError {
            kind: ErrorKind::Credit,
            title: "Not enough certification credit".to_string(),
            message: format!(
                "This certification needs {requested} credit unit(s) but the account \
                 has {available}. The document was not sent to the authority."
            ),
            user_actionable: true,
            suggested_actions: vec![
                "Purchase a credit pack".to_string(),
                "Wait for your plan cycle to renew its allowance".to_string(),
            ],
            technical_detail,
        },
        PipelineError::Ledger(_) => CategorizedError {
            kind: ErrorKind::Internal,
            title: "Credit accounting failed".to_string(),
            message: "The credit ledger could not process this certification. No credit \
                      was consumed."
                .to_string(),
            user_actionable: false,
            suggested_actions: vec!["Contact support with this error".to_string()],
            technical_detail,
        },

        PipelineError::Lifecycle(LifecycleError::Conflict { .. }) => CategorizedError {
            kind: ErrorKind::Conflict,
            title: "The document changed while you were working".to_string(),
            message: "Another session saved this document first. Reload it and repeat \
                      your action on the current version."
                .to_string(),
            user_actionable: true,
            suggested_actions: vec!["Reload the document and try again".to_string()],
            technical_detail,
        },
        PipelineError::Lifecycle(LifecycleError::DraftOnly { state }) => CategorizedError {
            kind: ErrorKind::DataEntry,
            title: "This document can no longer be edited".to_string(),
            message: format!(
                "The document is {state} and its content is locked. Cancel and re-issue \
                 it if the content must change."
            ),
            user_actionable: true,
            suggested_actions: vec![
                "Cancel the document with the appropriate reason".to_string(),
                "Create a corrected replacement document".to_string(),
            ],
            technical_detail,
        },
        PipelineError::Lifecycle(_) => CategorizedError {
            kind: ErrorKind::Internal,
            title: "The document is not in a state for this action".to_string(),
            message: "The requested step does not apply to the document's current state."
                .to_string(),
            user_actionable: false,
            suggested_actions: vec!["Refresh the document to see its current state".to_string()],
            technical_detail,
        },

        PipelineError::Generate(GenerateError::StaleValidation { .. }) => CategorizedError {
            kind: ErrorKind::DataEntry,
            title: "The document changed after validation".to_string(),
            message: "The draft was edited after its last validation, so the result no \
                      longer applies."
                .to_string(),
            user_actionable: true,
            suggested_actions: vec!["Run validation again on the current content".to_string()],
            technical_detail,
        },
        PipelineError::Generate(_) | PipelineError::Validation(_) | PipelineError::Payload { .. } => {
            CategorizedError {
                kind: ErrorKind::Internal,
                title: "Document processing failed".to_string(),
                message: "The document could not be processed. Nothing was sent to the \
                          authority and no credit was consumed."
                    .to_string(),
                user_actionable: false,
                suggested_actions: vec!["Contact support with this error".to_string()],
                technical_detail,
            }
        }

        PipelineError::CancelRefused { .. } => CategorizedError {
            kind: ErrorKind::Provider,
            title: "The authority refused the cancellation".to_string(),
            message: "The tax authority did not accept the cancellation request. The \
                      document remains certified."
                .to_string(),
            user_actionable: true,
            suggested_actions: vec![
                "Check the cancellation reason and replacement reference".to_string(),
            ],
            technical_detail,
        },

        PipelineError::MissingCertification(_) => CategorizedError {
            kind: ErrorKind::Internal,
            title: "Document record is inconsistent".to_string(),
            message: "The stored document is in an impossible state. Support needs to \
                      repair it."
                .to_string(),
            user_actionable: false,
            suggested_actions: vec!["Contact support with this error".to_string()],
            technical_detail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porteo_pac::Rejection;

    #[test]
    fn insufficient_balance_maps_to_credit() {
        let err = PipelineError::Ledger(LedgerError::InsufficientBalance {
            requested: 1,
            available: 0,
        });
        let cat = categorize(&err);
        assert_eq!(cat.kind, ErrorKind::Credit);
        assert!(cat.user_actionable);
        assert!(!cat.suggested_actions.is_empty());
    }

    #[test]
    fn transient_authority_failure_maps_to_connectivity() {
        let err = PipelineError::Authority(PacError::UnexpectedStatus {
            endpoint: "stamp".into(),
            status: 503,
            body: "maintenance".into(),
        });
        let cat = categorize(&err);
        assert_eq!(cat.kind, ErrorKind::Connectivity);
        assert!(cat.user_actionable);
    }

    #[test]
    fn rejection_categories_map_through() {
        let cases = [
            ("CP113", ErrorKind::DataEntry),
            ("303", ErrorKind::Credential),
            ("601", ErrorKind::Credit),
            ("307", ErrorKind::Duplicate),
            ("699", ErrorKind::Provider),
        ];
        for (code, expected) in cases {
            let err = PipelineError::Rejected(Rejection::new(code, "detalle del proveedor"));
            let cat = categorize(&err);
            assert_eq!(cat.kind, expected, "code {code}");
            // Raw provider text never becomes the primary message.
            assert!(!cat.message.contains("detalle del proveedor"));
            assert!(cat.technical_detail.contains("detalle del proveedor"));
        }
    }

    #[test]
    fn revision_conflict_maps_to_conflict() {
        let err = PipelineError::Lifecycle(LifecycleError::Conflict {
            document: porteo_core::DocumentId::new(),
            expected: 1,
            actual: 2,
        });
        assert_eq!(categorize(&err).kind, ErrorKind::Conflict);
    }

    #[test]
    fn not_certifiable_names_the_blocking_count() {
        let err = PipelineError::NotCertifiable {
            blocking: 3,
            score: 55,
        };
        let cat = categorize(&err);
        assert_eq!(cat.kind, ErrorKind::DataEntry);
        assert!(cat.message.contains('3'));
    }
}
