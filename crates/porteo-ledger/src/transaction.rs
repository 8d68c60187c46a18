//! # Ledger Transactions
//!
//! The append-only audit record of every balance mutation. Deltas are signed
//! and balances are the *combined* (prepaid + plan) totals, so the
//! conservation property `sum(delta) == final - initial` holds over any
//! sequence of operations on an account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use porteo_core::{AccountId, DocumentId, Timestamp};

/// What kind of mutation a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Units consumed by a certification.
    Consume,
    /// Units purchased (prepaid) or granted (plan) through a replenish.
    Replenish,
    /// Plan allowance reset to the cycle entitlement.
    PlanReset,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Consume => "CONSUME",
            Self::Replenish => "REPLENISH",
            Self::PlanReset => "PLAN_RESET",
        };
        f.write_str(s)
    }
}

/// What the transaction correlates to outside the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionReference {
    /// The document whose certification consumed the units.
    Document(DocumentId),
    /// The external purchase / invoice identifier of a replenish. Doubles
    /// as the idempotency key.
    Purchase(String),
    /// The subscription cycle identifier of a plan reset.
    PlanCycle(String),
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Entry identity.
    pub id: Uuid,
    /// The account mutated.
    pub account: AccountId,
    /// Kind of mutation.
    pub kind: TransactionKind,
    /// Signed unit delta: negative for consumption, positive for credit.
    pub delta: i64,
    /// Combined balance (prepaid + plan) before the mutation.
    pub balance_before: u64,
    /// Combined balance after the mutation.
    pub balance_after: u64,
    /// External correlation.
    pub reference: TransactionReference,
    /// When the mutation was applied.
    pub timestamp: Timestamp,
}
