//! # porteo-ledger — Certification Credit Ledger
//!
//! Tracks two balances per account: prepaid units bought in packs, and
//! plan-allowance units granted by the subscription cycle. Certification
//! costs are debited here *before* the authority is called, so an account
//! that cannot pay never reaches the authority; each debit is keyed to the
//! content digest it pays for, so a retried submission of the same bytes is
//! never charged twice.
//!
//! ## Discipline
//!
//! - **Atomicity.** `consume` either debits the full amount or changes
//!   nothing. There is no partial debit state to reconcile.
//! - **Fixed drain order.** Prepaid first, then plan allowance. Prepaid
//!   units were paid for directly and never expire; plan units reset each
//!   cycle, so the order maximizes what the customer keeps.
//! - **Append-only log.** Every balance mutation appends exactly one
//!   [`LedgerTransaction`]. The log is the audit trail; it is never edited.
//! - **Idempotent replenish.** Payment callbacks retry. A repeated
//!   `replenish` for the same external purchase id is a no-op returning the
//!   originally recorded transaction.
//! - **Idempotent consume.** Certification retries resubmit the same
//!   canonical bytes. A repeated `consume` for a content digest the account
//!   already paid is a no-op returning the recorded consumption.
//! - **Per-account serialization.** Concurrent consumes on one account
//!   serialize on the account entry; different accounts are independent.

pub mod ledger;
pub mod transaction;

pub use ledger::{Bucket, BalanceSnapshot, Consumption, CreditLedger, FundingSource, LedgerError};
pub use transaction::{LedgerTransaction, TransactionKind, TransactionReference};
