//! Accrual and recurring-payment sweeps
//!
//! Periodic bookkeeping over the ledger: late fees and interest on loans
//! past due, and replay of recurring installments. Each sweep is
//! fire-and-forget per item: a failure on one loan or one installment is
//! logged and the sweep moves on.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::entry::{LedgerEntry, NewEntry};
use super::store::LedgerStore;
use crate::directory::{AccountDirectory, CustomerRank};

/// Flat late fee per rank, in currency units.
fn late_fee(rank: CustomerRank) -> Decimal {
    match rank {
        CustomerRank::Base => Decimal::from(100),
        CustomerRank::Silver => Decimal::from(75),
        CustomerRank::Gold => Decimal::from(50),
    }
}

/// Yearly interest rate per rank, applied to the current loan balance.
fn interest_rate(rank: CustomerRank) -> Decimal {
    match rank {
        CustomerRank::Base => Decimal::new(5, 2),
        CustomerRank::Silver => Decimal::new(4, 2),
        CustomerRank::Gold => Decimal::new(3, 2),
    }
}

pub struct AccrualSweeps {
    store: Arc<LedgerStore>,
    directory: Arc<AccountDirectory>,
    lending_account: Uuid,
}

impl AccrualSweeps {
    pub fn new(
        store: Arc<LedgerStore>,
        directory: Arc<AccountDirectory>,
        lending_account: Uuid,
    ) -> Self {
        Self {
            store,
            directory,
            lending_account,
        }
    }

    /// Loans that accrue charges: issued over a year before `now` and not
    /// fully repaid.
    fn due_loans(&self, now: DateTime<Utc>) -> Vec<(LedgerEntry, Decimal)> {
        self.store
            .outstanding_loans(self.lending_account)
            .into_iter()
            .filter(|loan| {
                loan.created_at
                    .checked_add_months(Months::new(12))
                    .is_some_and(|due| due <= now)
            })
            .filter_map(|loan| match self.store.loan_balance(loan.transaction_id) {
                Ok(balance) if !balance.is_zero() => Some((loan, balance)),
                Ok(_) => None,
                Err(e) => {
                    warn!(loan_id = %loan.transaction_id, error = %e, "Skipping loan without balance");
                    None
                }
            })
            .collect()
    }

    fn borrower_rank(&self, loan: &LedgerEntry) -> Option<CustomerRank> {
        let account = self.directory.resolve_account(loan.destination)?;
        self.directory.rank_of(account.customer_id)
    }

    /// Post a flat, rank-tiered late fee for every loan past due.
    /// Returns the number of fees posted.
    pub fn post_late_fees(&self, now: DateTime<Utc>) -> usize {
        let mut posted = 0;
        for (loan, _) in self.due_loans(now) {
            let Some(rank) = self.borrower_rank(&loan) else {
                warn!(loan_id = %loan.transaction_id, "Borrower not found for late fee");
                continue;
            };
            let result = self.store.append(
                NewEntry::transfer(loan.destination, self.lending_account, late_fee(rank))
                    .with_comment(format!("Late fee for loan: {}", loan.transaction_id)),
            );
            match result {
                Ok(_) => {
                    info!(loan_id = %loan.transaction_id, rank = %rank, "Late fee added");
                    posted += 1;
                }
                Err(e) => warn!(loan_id = %loan.transaction_id, error = %e, "Late fee failed"),
            }
        }
        posted
    }

    /// Post rank-tiered interest on the current balance of every loan past
    /// due. Returns the number of interest entries posted.
    pub fn post_interest(&self, now: DateTime<Utc>) -> usize {
        let mut posted = 0;
        for (loan, balance) in self.due_loans(now) {
            let Some(rank) = self.borrower_rank(&loan) else {
                warn!(loan_id = %loan.transaction_id, "Borrower not found for interest");
                continue;
            };
            let amount = crate::money::to_ledger_scale(balance * interest_rate(rank));
            let result = self.store.append(
                NewEntry::transfer(loan.destination, self.lending_account, amount)
                    .with_comment(format!("Interest for loan: {}", loan.transaction_id)),
            );
            match result {
                Ok(_) => {
                    info!(loan_id = %loan.transaction_id, %amount, "Interest added");
                    posted += 1;
                }
                Err(e) => warn!(loan_id = %loan.transaction_id, error = %e, "Interest failed"),
            }
        }
        posted
    }

    /// Replay every entry with remaining installments whose origin can
    /// cover it this cycle. Insufficient funds is not a failure here, just
    /// a deferred retry next cycle. Returns the number of replays created.
    pub fn replay_recurring(&self) -> usize {
        let mut replayed = 0;
        for entry in self.store.recurring_entries() {
            if self.store.balance_of(entry.origin) < entry.amount {
                info!(
                    transaction_id = %entry.transaction_id,
                    "Skipping recurring payment, insufficient funds this cycle"
                );
                continue;
            }
            let clone = NewEntry {
                transaction_id: None,
                origin: entry.origin,
                destination: entry.destination,
                amount: entry.amount,
                loan_ref: entry.loan_ref,
                months_remaining: None,
                comment: entry.comment.clone(),
            };
            match self.store.append(clone).and_then(|created| {
                self.store.decrement_months(entry.transaction_id)?;
                Ok(created)
            }) {
                Ok(created) => {
                    info!(
                        source = %entry.transaction_id,
                        created = %created.transaction_id,
                        "Recurring payment created"
                    );
                    replayed += 1;
                }
                Err(e) => {
                    warn!(
                        transaction_id = %entry.transaction_id,
                        error = %e,
                        "Recurring payment failed"
                    );
                }
            }
        }
        replayed
    }

    /// One full sweep cycle: fees, interest, then recurring replay.
    pub fn run_once(&self, now: DateTime<Utc>) {
        self.post_late_fees(now);
        self.post_interest(now);
        self.replay_recurring();
    }
}

/// Ignore individual errors and keep sweeping on a fixed interval.
pub fn spawn_scheduler(sweeps: Arc<AccrualSweeps>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            sweeps.run_once(Utc::now());
        }
    });
}
