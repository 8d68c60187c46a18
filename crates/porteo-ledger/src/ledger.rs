//! # Credit Ledger Operations
//!
//! All mutation goes through [`CreditLedger::consume`],
//! [`CreditLedger::replenish`], and [`CreditLedger::reset_plan_allowance`].
//! Balances are plain unsigned integers; there is no currency arithmetic
//! here, a unit is a unit.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use porteo_core::{AccountId, ContentDigest, DocumentId, Timestamp};

use crate::transaction::{LedgerTransaction, TransactionKind, TransactionReference};

/// Which balance bucket a consumption was funded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    /// Entirely from prepaid units.
    Prepaid,
    /// Entirely from the plan allowance.
    Plan,
    /// Drained the prepaid remainder, then the plan allowance.
    Mixed,
}

/// Target bucket of a replenish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Prepaid units (purchases).
    Prepaid,
    /// Plan allowance units (subscription grants).
    Plan,
}

/// Read-only view of an account's balances and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Prepaid units available.
    pub prepaid: u64,
    /// Plan-allowance units available this cycle.
    pub plan_allowance: u64,
    /// Lifetime units consumed. Monotonic.
    pub total_consumed: u64,
    /// Lifetime units purchased. Monotonic.
    pub total_purchased: u64,
}

impl BalanceSnapshot {
    /// Combined spendable units.
    pub fn combined(&self) -> u64 {
        self.prepaid + self.plan_allowance
    }
}

/// Outcome of a successful consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    /// Which bucket(s) funded the debit.
    pub source: FundingSource,
    /// Units taken from prepaid.
    pub from_prepaid: u64,
    /// Units taken from the plan allowance.
    pub from_plan: u64,
    /// Combined units remaining after the debit.
    pub remaining: u64,
    /// The ledger entry recording the debit.
    pub transaction: LedgerTransaction,
}

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The account has not been opened.
    #[error("unknown account {0}")]
    UnknownAccount(AccountId),

    /// Zero-unit operations are rejected rather than logged as no-ops.
    #[error("units must be positive")]
    ZeroUnits,

    /// Combined balance cannot cover the request. Nothing was debited.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Units requested.
        requested: u64,
        /// Combined units available at the time of the attempt.
        available: u64,
    },

    /// A balance counter would overflow.
    #[error("balance overflow on account {0}")]
    Overflow(AccountId),
}

#[derive(Debug, Default, Clone)]
struct AccountState {
    prepaid: u64,
    plan_allowance: u64,
    total_consumed: u64,
    total_purchased: u64,
}

impl AccountState {
    fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            prepaid: self.prepaid,
            plan_allowance: self.plan_allowance,
            total_consumed: self.total_consumed,
            total_purchased: self.total_purchased,
        }
    }
}

/// The credit ledger.
///
/// Same-account operations serialize on the account's map entry; the
/// transaction log has its own lock and is only ever appended to while the
/// account entry is held, so log order matches balance order per account.
#[derive(Default)]
pub struct CreditLedger {
    accounts: DashMap<AccountId, AccountState>,
    log: Mutex<Vec<LedgerTransaction>>,
    applied_purchases: DashMap<String, LedgerTransaction>,
    charged_content: DashMap<(AccountId, ContentDigest), Consumption>,
}

impl CreditLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with zero balances. Opening an existing account is a
    /// no-op.
    pub fn open_account(&self, account: AccountId) {
        self.accounts.entry(account).or_default();
    }

    /// Current balances, if the account exists.
    pub fn balance(&self, account: AccountId) -> Option<BalanceSnapshot> {
        self.accounts.get(&account).map(|s| s.snapshot())
    }

    /// Pre-flight read: whether the combined balance covers `units`.
    ///
    /// This is **not** a reservation. The balance can change between this
    /// call and `consume`; the authoritative check is the atomicity inside
    /// [`CreditLedger::consume`]. UI use only.
    pub fn has_sufficient_balance(&self, account: AccountId, units: u64) -> bool {
        self.balance(account)
            .map(|b| b.combined() >= units)
            .unwrap_or(false)
    }

    /// Atomically debit `units` for the content identified by `digest`,
    /// draining prepaid first, then the plan allowance.
    ///
    /// Idempotent per `(account, digest)`: a repeated call for content the
    /// account already paid for returns the originally recorded consumption
    /// and changes nothing. Certification retries resubmit the same
    /// canonical bytes and must never be charged twice for them; edited
    /// content has a new digest and pays again.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] if the combined balance cannot
    /// cover the full amount; the account is left byte-for-byte unchanged
    /// and no transaction is logged.
    pub fn consume(
        &self,
        account: AccountId,
        units: u64,
        document: DocumentId,
        digest: ContentDigest,
    ) -> Result<Consumption, LedgerError> {
        if units == 0 {
            return Err(LedgerError::ZeroUnits);
        }

        // The entry guard holds the idempotency slot while the debit is
        // applied, so a concurrent duplicate waits and then sees Occupied.
        let slot = match self.charged_content.entry((account, digest)) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                tracing::debug!(account = %account, %digest, "content already charged, consume ignored");
                return Ok(existing.get().clone());
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => slot,
        };

        let mut state = self
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::UnknownAccount(account))?;

        let available = state.prepaid + state.plan_allowance;
        if available < units {
            return Err(LedgerError::InsufficientBalance {
                requested: units,
                available,
            });
        }

        let new_total = state
            .total_consumed
            .checked_add(units)
            .ok_or(LedgerError::Overflow(account))?;
        let from_prepaid = state.prepaid.min(units);
        let from_plan = units - from_prepaid;
        state.prepaid -= from_prepaid;
        state.plan_allowance -= from_plan;
        state.total_consumed = new_total;

        let source = match (from_prepaid, from_plan) {
            (_, 0) => FundingSource::Prepaid,
            (0, _) => FundingSource::Plan,
            _ => FundingSource::Mixed,
        };
        let transaction = self.append(
            account,
            TransactionKind::Consume,
            -(units as i64),
            available,
            available - units,
            TransactionReference::Document(document),
        );
        tracing::info!(
            account = %account,
            units,
            ?source,
            remaining = available - units,
            "credit consumed"
        );

        let consumption = Consumption {
            source,
            from_prepaid,
            from_plan,
            remaining: available - units,
            transaction,
        };
        slot.insert(consumption.clone());
        Ok(consumption)
    }

    /// Credit `units` into a bucket, idempotent on `purchase_id`.
    ///
    /// A repeated call with a purchase id that was already applied returns
    /// the originally recorded transaction and changes nothing: payment
    /// providers redeliver callbacks and must not double-credit.
    pub fn replenish(
        &self,
        account: AccountId,
        units: u64,
        bucket: Bucket,
        purchase_id: &str,
    ) -> Result<LedgerTransaction, LedgerError> {
        if units == 0 {
            return Err(LedgerError::ZeroUnits);
        }

        // The entry guard holds the idempotency slot while the credit is
        // applied, so a concurrent duplicate waits and then sees Occupied.
        match self.applied_purchases.entry(purchase_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                tracing::debug!(purchase_id, "duplicate replenish ignored");
                Ok(existing.get().clone())
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let mut state = self
                    .accounts
                    .get_mut(&account)
                    .ok_or(LedgerError::UnknownAccount(account))?;

                let before = state.prepaid + state.plan_allowance;
                match bucket {
                    Bucket::Prepaid => {
                        state.prepaid = state
                            .prepaid
                            .checked_add(units)
                            .ok_or(LedgerError::Overflow(account))?;
                        state.total_purchased = state
                            .total_purchased
                            .checked_add(units)
                            .ok_or(LedgerError::Overflow(account))?;
                    }
                    Bucket::Plan => {
                        state.plan_allowance = state
                            .plan_allowance
                            .checked_add(units)
                            .ok_or(LedgerError::Overflow(account))?;
                    }
                }

                let transaction = self.append(
                    account,
                    TransactionKind::Replenish,
                    units as i64,
                    before,
                    before + units,
                    TransactionReference::Purchase(purchase_id.to_string()),
                );
                tracing::info!(account = %account, units, ?bucket, purchase_id, "credit replenished");
                slot.insert(transaction.clone());
                Ok(transaction)
            }
        }
    }

    /// Reset the plan allowance to the cycle entitlement, independent of
    /// consumption. Runs on every renewal cycle; the prepaid bucket is
    /// untouched.
    pub fn reset_plan_allowance(
        &self,
        account: AccountId,
        entitlement: u64,
        cycle_id: &str,
    ) -> Result<LedgerTransaction, LedgerError> {
        let mut state = self
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::UnknownAccount(account))?;

        let before = state.prepaid + state.plan_allowance;
        state.plan_allowance = entitlement;
        let after = state.prepaid + state.plan_allowance;

        let transaction = self.append(
            account,
            TransactionKind::PlanReset,
            after as i64 - before as i64,
            before,
            after,
            TransactionReference::PlanCycle(cycle_id.to_string()),
        );
        tracing::info!(account = %account, entitlement, cycle_id, "plan allowance reset");
        Ok(transaction)
    }

    /// Every transaction for an account, in application order.
    pub fn transactions_for(&self, account: AccountId) -> Vec<LedgerTransaction> {
        self.log
            .lock()
            .iter()
            .filter(|t| t.account == account)
            .cloned()
            .collect()
    }

    fn append(
        &self,
        account: AccountId,
        kind: TransactionKind,
        delta: i64,
        balance_before: u64,
        balance_after: u64,
        reference: TransactionReference,
    ) -> LedgerTransaction {
        let transaction = LedgerTransaction {
            id: Uuid::new_v4(),
            account,
            kind,
            delta,
            balance_before,
            balance_after,
            reference,
            timestamp: Timestamp::now(),
        };
        self.log.lock().push(transaction.clone());
        transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(n: u8) -> ContentDigest {
        ContentDigest([n; 32])
    }

    fn funded_ledger(prepaid: u64, plan: u64) -> (CreditLedger, AccountId) {
        let ledger = CreditLedger::new();
        let account = AccountId::new();
        ledger.open_account(account);
        if prepaid > 0 {
            ledger
                .replenish(account, prepaid, Bucket::Prepaid, "seed-prepaid")
                .unwrap();
        }
        if plan > 0 {
            ledger
                .replenish(account, plan, Bucket::Plan, "seed-plan")
                .unwrap();
        }
        (ledger, account)
    }

    #[test]
    fn consume_drains_prepaid_then_plan() {
        // prepaid=3, plan=10, consume 5: both buckets touched.
        let (ledger, account) = funded_ledger(3, 10);
        let result = ledger
            .consume(account, 5, DocumentId::new(), digest(1))
            .unwrap();

        assert_eq!(result.source, FundingSource::Mixed);
        assert_eq!(result.from_prepaid, 3);
        assert_eq!(result.from_plan, 2);

        let balance = ledger.balance(account).unwrap();
        assert_eq!(balance.prepaid, 0);
        assert_eq!(balance.plan_allowance, 8);

        let consumes: Vec<_> = ledger
            .transactions_for(account)
            .into_iter()
            .filter(|t| t.kind == TransactionKind::Consume)
            .collect();
        assert_eq!(consumes.len(), 1);
        assert_eq!(consumes[0].delta, -5);
    }

    #[test]
    fn insufficient_balance_changes_nothing() {
        // prepaid=0, plan=2, consume 5: fails atomically.
        let (ledger, account) = funded_ledger(0, 2);
        let before = ledger.balance(account).unwrap();

        match ledger.consume(account, 5, DocumentId::new(), digest(2)) {
            Err(LedgerError::InsufficientBalance {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }

        assert_eq!(ledger.balance(account).unwrap(), before);
        assert!(ledger
            .transactions_for(account)
            .iter()
            .all(|t| t.kind != TransactionKind::Consume));
    }

    #[test]
    fn consume_entirely_from_prepaid() {
        let (ledger, account) = funded_ledger(10, 5);
        let result = ledger
            .consume(account, 4, DocumentId::new(), digest(3))
            .unwrap();
        assert_eq!(result.source, FundingSource::Prepaid);
        assert_eq!(ledger.balance(account).unwrap().plan_allowance, 5);
    }

    #[test]
    fn consume_entirely_from_plan() {
        let (ledger, account) = funded_ledger(0, 5);
        let result = ledger
            .consume(account, 4, DocumentId::new(), digest(4))
            .unwrap();
        assert_eq!(result.source, FundingSource::Plan);
    }

    #[test]
    fn repeated_consume_for_same_content_is_noop() {
        let (ledger, account) = funded_ledger(5, 0);
        let document = DocumentId::new();

        let first = ledger.consume(account, 1, document, digest(20)).unwrap();
        let second = ledger.consume(account, 1, document, digest(20)).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.balance(account).unwrap().prepaid, 4);
        let consumes = ledger
            .transactions_for(account)
            .into_iter()
            .filter(|t| t.kind == TransactionKind::Consume)
            .count();
        assert_eq!(consumes, 1);

        // New content, new charge.
        ledger.consume(account, 1, document, digest(21)).unwrap();
        assert_eq!(ledger.balance(account).unwrap().prepaid, 3);
    }

    #[test]
    fn duplicate_replenish_is_noop() {
        let (ledger, account) = funded_ledger(0, 0);
        let first = ledger
            .replenish(account, 50, Bucket::Prepaid, "pay-X")
            .unwrap();
        let second = ledger
            .replenish(account, 50, Bucket::Prepaid, "pay-X")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.balance(account).unwrap().prepaid, 50);
        // Exactly one replenish logged.
        let replenishes = ledger
            .transactions_for(account)
            .into_iter()
            .filter(|t| t.kind == TransactionKind::Replenish)
            .count();
        assert_eq!(replenishes, 1);
    }

    #[test]
    fn plan_reset_sets_entitlement_regardless_of_remainder() {
        let (ledger, account) = funded_ledger(7, 3);
        ledger
            .consume(account, 8, DocumentId::new(), digest(5))
            .unwrap();
        ledger.reset_plan_allowance(account, 10, "2026-04").unwrap();

        let balance = ledger.balance(account).unwrap();
        assert_eq!(balance.plan_allowance, 10);
        assert_eq!(balance.prepaid, 0, "reset must not touch prepaid");
    }

    #[test]
    fn has_sufficient_balance_is_a_pure_read() {
        let (ledger, account) = funded_ledger(1, 1);
        assert!(ledger.has_sufficient_balance(account, 2));
        assert!(!ledger.has_sufficient_balance(account, 3));
        // No transactions from reads.
        let kinds: Vec<_> = ledger
            .transactions_for(account)
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert!(kinds.iter().all(|k| *k == TransactionKind::Replenish));
    }

    #[test]
    fn zero_units_rejected() {
        let (ledger, account) = funded_ledger(5, 0);
        assert!(matches!(
            ledger.consume(account, 0, DocumentId::new(), digest(6)),
            Err(LedgerError::ZeroUnits)
        ));
        assert!(matches!(
            ledger.replenish(account, 0, Bucket::Prepaid, "pay-Z"),
            Err(LedgerError::ZeroUnits)
        ));
    }

    #[test]
    fn unknown_account_rejected() {
        let ledger = CreditLedger::new();
        assert!(matches!(
            ledger.consume(AccountId::new(), 1, DocumentId::new(), digest(7)),
            Err(LedgerError::UnknownAccount(_))
        ));
    }

    #[test]
    fn total_counters_are_monotonic() {
        let (ledger, account) = funded_ledger(10, 0);
        ledger
            .consume(account, 3, DocumentId::new(), digest(8))
            .unwrap();
        ledger
            .consume(account, 2, DocumentId::new(), digest(9))
            .unwrap();
        let balance = ledger.balance(account).unwrap();
        assert_eq!(balance.total_consumed, 5);
        assert_eq!(balance.total_purchased, 10);
    }

    #[test]
    fn log_chains_balances_under_concurrency() {
        let ledger = CreditLedger::new();
        let account = AccountId::new();
        ledger.open_account(account);

        std::thread::scope(|s| {
            for t in 0..4u8 {
                let ledger = &ledger;
                s.spawn(move || {
                    for i in 0..25u8 {
                        ledger
                            .replenish(account, 2, Bucket::Prepaid, &format!("pay-{t}-{i}"))
                            .unwrap();
                        let mut d = [0u8; 32];
                        d[0] = t;
                        d[1] = i;
                        ledger
                            .consume(account, 1, DocumentId::new(), ContentDigest(d))
                            .unwrap();
                    }
                });
            }
        });

        // The append happens while the account entry is held, so log order
        // is balance order: every entry opens at the previous close.
        let mut running = 0u64;
        for tx in ledger.transactions_for(account) {
            assert_eq!(tx.balance_before, running);
            running = tx.balance_after;
        }
        assert_eq!(running, ledger.balance(account).unwrap().combined());
    }

    mod conservation {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Consume(u64),
            Replenish(u64, bool),
            Reset(u64),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u64..10).prop_map(Op::Consume),
                ((1u64..20), any::<bool>()).prop_map(|(n, p)| Op::Replenish(n, p)),
                (0u64..15).prop_map(Op::Reset),
            ]
        }

        proptest! {
            /// For any op sequence, the sum of logged deltas equals the
            /// final combined balance minus the initial one.
            #[test]
            fn deltas_sum_to_balance_change(ops in proptest::collection::vec(op_strategy(), 1..40)) {
                let ledger = CreditLedger::new();
                let account = AccountId::new();
                ledger.open_account(account);
                let initial = ledger.balance(account).unwrap().combined();

                for (i, op) in ops.iter().enumerate() {
                    match op {
                        Op::Consume(n) => {
                            // Insufficient-balance failures must not log.
                            let _ = ledger.consume(account, *n, DocumentId::new(), digest(i as u8));
                        }
                        Op::Replenish(n, prepaid) => {
                            let bucket = if *prepaid { Bucket::Prepaid } else { Bucket::Plan };
                            ledger.replenish(account, *n, bucket, &format!("pay-{i}")).unwrap();
                        }
                        Op::Reset(e) => {
                            ledger.reset_plan_allowance(account, *e, &format!("cycle-{i}")).unwrap();
                        }
                    }
                }

                let delta_sum: i64 = ledger
                    .transactions_for(account)
                    .iter()
                    .map(|t| t.delta)
                    .sum();
                let final_combined = ledger.balance(account).unwrap().combined();
                prop_assert_eq!(delta_sum, final_combined as i64 - initial as i64);
            }
        }
    }
}
