//! Ledger store
//!
//! Append-only log of [`LedgerEntry`] records. Every derived value
//! (balance, history, loan balance) is recomputed from the full log per
//! query; there is no cached counter to drift.
//!
//! The lock guards individual log accesses only. Callers that read a
//! balance and then append (the transfer engine) do so as two separate
//! store calls with no lock held in between; that check-then-act window is
//! part of the documented consistency model, not something this store
//! serializes away.

use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::entry::{LedgerEntry, NewEntry};
use crate::error::BankError;

#[derive(Default)]
pub struct LedgerStore {
    log: RwLock<Vec<LedgerEntry>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry to the log.
    ///
    /// Rejects non-positive amounts, same-account transfers, and duplicate
    /// transaction ids. Duplicate rejection is what makes entry creation
    /// idempotent under coordinator retry: the second attempt with the same
    /// id fails here and the caller returns the already-recorded entry.
    pub fn append(&self, new: NewEntry) -> Result<LedgerEntry, BankError> {
        if new.amount <= Decimal::ZERO {
            return Err(BankError::NonPositiveAmount(new.amount));
        }
        if new.origin == new.destination {
            return Err(BankError::SameAccount(new.origin));
        }

        let entry = LedgerEntry {
            transaction_id: new.transaction_id.unwrap_or_else(Uuid::new_v4),
            origin: new.origin,
            destination: new.destination,
            amount: new.amount,
            loan_ref: new.loan_ref,
            months_remaining: new.months_remaining,
            created_at: Utc::now(),
            comment: new.comment,
        };

        let mut log = self.log.write().expect("ledger lock poisoned");
        if log
            .iter()
            .any(|e| e.transaction_id == entry.transaction_id)
        {
            return Err(BankError::DuplicateId(entry.transaction_id));
        }
        log.push(entry.clone());
        Ok(entry)
    }

    /// Derived balance: incoming minus outgoing over the full log. Zero for
    /// an account with no entries. May legitimately be negative (the bank's
    /// lending account is not constrained).
    pub fn balance_of(&self, account_id: Uuid) -> Decimal {
        let log = self.log.read().expect("ledger lock poisoned");
        log.iter().fold(Decimal::ZERO, |acc, e| {
            if e.destination == account_id {
                acc + e.amount
            } else if e.origin == account_id {
                acc - e.amount
            } else {
                acc
            }
        })
    }

    /// All entries touching `account_id`, ascending by creation time.
    /// Empty, never an error, for an unknown account.
    pub fn history_of(&self, account_id: Uuid) -> Vec<LedgerEntry> {
        let log = self.log.read().expect("ledger lock poisoned");
        let mut history: Vec<LedgerEntry> = log
            .iter()
            .filter(|e| e.origin == account_id || e.destination == account_id)
            .cloned()
            .collect();
        history.sort_by_key(|e| e.created_at);
        history
    }

    /// Outstanding balance of a loan: the originating entry's amount minus
    /// the sum of every entry whose `loan_ref` points at it.
    pub fn loan_balance(&self, loan_id: Uuid) -> Result<Decimal, BankError> {
        let log = self.log.read().expect("ledger lock poisoned");
        let loaned = log
            .iter()
            .find(|e| e.transaction_id == loan_id)
            .map(|e| e.amount)
            .ok_or_else(|| {
                BankError::NotFound(format!("Ledger entry with id {loan_id} does not exist"))
            })?;
        let repaid: Decimal = log
            .iter()
            .filter(|e| e.loan_ref == Some(loan_id))
            .map(|e| e.amount)
            .sum();
        Ok(loaned - repaid)
    }

    pub fn get(&self, transaction_id: Uuid) -> Option<LedgerEntry> {
        let log = self.log.read().expect("ledger lock poisoned");
        log.iter()
            .find(|e| e.transaction_id == transaction_id)
            .cloned()
    }

    /// Hard delete by transaction id. Only the broker's compensation path
    /// calls this; ordinary transfer paths never remove entries.
    pub fn remove(&self, transaction_id: Uuid) -> Result<(), BankError> {
        let mut log = self.log.write().expect("ledger lock poisoned");
        let before = log.len();
        log.retain(|e| e.transaction_id != transaction_id);
        if log.len() == before {
            return Err(BankError::NotFound(format!(
                "Ledger entry with id {transaction_id} does not exist"
            )));
        }
        Ok(())
    }

    /// Decrement `months_remaining` by one. The single permitted in-place
    /// mutation, used by the recurring-payment sweep.
    pub fn decrement_months(&self, transaction_id: Uuid) -> Result<(), BankError> {
        let mut log = self.log.write().expect("ledger lock poisoned");
        let entry = log
            .iter_mut()
            .find(|e| e.transaction_id == transaction_id)
            .ok_or_else(|| {
                BankError::NotFound(format!(
                    "Ledger entry with id {transaction_id} does not exist"
                ))
            })?;
        entry.months_remaining = entry.months_remaining.map(|m| m.saturating_sub(1));
        Ok(())
    }

    /// Loan entries issued by `lending_account` (no loan_ref, origin is the
    /// lending account). Candidate set for fee/interest sweeps.
    pub fn outstanding_loans(&self, lending_account: Uuid) -> Vec<LedgerEntry> {
        let log = self.log.read().expect("ledger lock poisoned");
        log.iter()
            .filter(|e| e.is_loan_from(lending_account))
            .cloned()
            .collect()
    }

    /// Entries still due to repeat (`months_remaining` >= 1).
    pub fn recurring_entries(&self) -> Vec<LedgerEntry> {
        let log = self.log.read().expect("ledger lock poisoned");
        log.iter()
            .filter(|e| e.months_remaining.is_some_and(|m| m >= 1))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().expect("ledger lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit(store: &LedgerStore, account: Uuid, amount: i64) -> LedgerEntry {
        store
            .append(NewEntry::transfer(
                Uuid::new_v4(),
                account,
                Decimal::from(amount),
            ))
            .unwrap()
    }

    #[test]
    fn test_balance_is_signed_sum() {
        let store = LedgerStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        credit(&store, a, 1000);
        store
            .append(NewEntry::transfer(a, b, Decimal::from(600)))
            .unwrap();

        assert_eq!(store.balance_of(a), Decimal::from(400));
        assert_eq!(store.balance_of(b), Decimal::from(600));
    }

    #[test]
    fn test_fresh_account_has_zero_balance_and_empty_history() {
        let store = LedgerStore::new();
        let a = Uuid::new_v4();
        assert_eq!(store.balance_of(a), Decimal::ZERO);
        assert!(store.history_of(a).is_empty());
    }

    #[test]
    fn test_balance_can_go_negative() {
        // The lending account is allowed to overdraft; the store itself
        // never enforces a funds check.
        let store = LedgerStore::new();
        let bank = Uuid::new_v4();
        let a = Uuid::new_v4();
        store
            .append(NewEntry::transfer(bank, a, Decimal::from(10_000)))
            .unwrap();
        assert_eq!(store.balance_of(bank), Decimal::from(-10_000));
    }

    #[test]
    fn test_append_rejects_non_positive_amount() {
        let store = LedgerStore::new();
        let err = store
            .append(NewEntry::transfer(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Decimal::ZERO,
            ))
            .unwrap_err();
        assert!(matches!(err, BankError::NonPositiveAmount(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_rejects_same_account() {
        let store = LedgerStore::new();
        let a = Uuid::new_v4();
        let err = store
            .append(NewEntry::transfer(a, a, Decimal::from(10)))
            .unwrap_err();
        assert!(matches!(err, BankError::SameAccount(_)));
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let store = LedgerStore::new();
        let txid = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .append(NewEntry::transfer(a, b, Decimal::from(10)).with_id(txid))
            .unwrap();
        let err = store
            .append(NewEntry::transfer(a, b, Decimal::from(10)).with_id(txid))
            .unwrap_err();
        assert!(matches!(err, BankError::DuplicateId(id) if id == txid));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_is_ordered_and_restartable() {
        let store = LedgerStore::new();
        let a = Uuid::new_v4();
        credit(&store, a, 1);
        credit(&store, a, 2);
        credit(&store, a, 3);

        let history = store.history_of(a);
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        // A fresh call re-scans and yields the same view
        assert_eq!(store.history_of(a), history);
    }

    #[test]
    fn test_loan_balance_after_repayments() {
        let store = LedgerStore::new();
        let bank = Uuid::new_v4();
        let a = Uuid::new_v4();
        let loan = store
            .append(NewEntry::transfer(bank, a, Decimal::from(10_000)))
            .unwrap();

        for _ in 0..2 {
            store
                .append(
                    NewEntry::transfer(a, bank, Decimal::from(1_000))
                        .with_loan_ref(loan.transaction_id),
                )
                .unwrap();
        }

        assert_eq!(
            store.loan_balance(loan.transaction_id).unwrap(),
            Decimal::from(8_000)
        );
    }

    #[test]
    fn test_loan_balance_unknown_loan_is_not_found() {
        let store = LedgerStore::new();
        assert!(matches!(
            store.loan_balance(Uuid::new_v4()),
            Err(BankError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_and_missing_remove() {
        let store = LedgerStore::new();
        let e = credit(&store, Uuid::new_v4(), 5);
        store.remove(e.transaction_id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.remove(e.transaction_id),
            Err(BankError::NotFound(_))
        ));
    }

    #[test]
    fn test_decrement_months() {
        let store = LedgerStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let e = store
            .append(NewEntry::transfer(a, b, Decimal::from(50)).with_months(Some(3)))
            .unwrap();

        store.decrement_months(e.transaction_id).unwrap();
        assert_eq!(
            store.get(e.transaction_id).unwrap().months_remaining,
            Some(2)
        );

        assert_eq!(store.recurring_entries().len(), 1);
        store.decrement_months(e.transaction_id).unwrap();
        store.decrement_months(e.transaction_id).unwrap();
        assert!(store.recurring_entries().is_empty());
    }
}
