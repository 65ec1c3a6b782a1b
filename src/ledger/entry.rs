//! Ledger entry types
//!
//! A [`LedgerEntry`] is the atomic unit of truth: one immutable record of
//! value moving from an origin account to a destination account. Account
//! balances and loan balances are derived from the full entry log, never
//! stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Globally unique, assigned once. Doubles as the idempotency key for
    /// cross-node commits.
    pub transaction_id: Uuid,
    pub origin: Uuid,
    pub destination: Uuid,
    /// Strictly positive, two decimal places.
    pub amount: Decimal,
    /// Present only on repayment entries; points at the loan entry this
    /// repayment reduces.
    pub loan_ref: Option<Uuid>,
    /// Present only on entries representing a recurring obligation still
    /// due to repeat. The only field the scheduler may mutate.
    pub months_remaining: Option<u32>,
    /// Assigned by the store at insert time; sole ordering key for history.
    pub created_at: DateTime<Utc>,
    pub comment: Option<String>,
}

impl LedgerEntry {
    /// Is this an outstanding-loan entry issued by `lending_account`?
    pub fn is_loan_from(&self, lending_account: Uuid) -> bool {
        self.loan_ref.is_none() && self.origin == lending_account
    }
}

/// Input to [`LedgerStore::append`](super::store::LedgerStore::append).
/// `transaction_id` may be supplied by a coordinator (shared across both
/// legs of a cross-node transfer) or left to the store to generate.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub transaction_id: Option<Uuid>,
    pub origin: Uuid,
    pub destination: Uuid,
    pub amount: Decimal,
    pub loan_ref: Option<Uuid>,
    pub months_remaining: Option<u32>,
    pub comment: Option<String>,
}

impl NewEntry {
    /// Plain transfer with no loan linkage or recurrence.
    pub fn transfer(origin: Uuid, destination: Uuid, amount: Decimal) -> Self {
        Self {
            transaction_id: None,
            origin,
            destination,
            amount,
            loan_ref: None,
            months_remaining: None,
            comment: None,
        }
    }

    pub fn with_id(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_loan_ref(mut self, loan_ref: Uuid) -> Self {
        self.loan_ref = Some(loan_ref);
        self
    }

    pub fn with_months(mut self, months: Option<u32>) -> Self {
        self.months_remaining = months;
        self
    }
}
