//! Transfer engine
//!
//! Validates and creates ledger entries for intra-node transfers, and
//! derives the loan lifecycle (issue, repay, summarize) on top of entry
//! creation.
//!
//! The sufficient-funds check reads the balance and then appends as two
//! separate store calls; two concurrent transfers from the same origin can
//! both pass the check. See the crate-level consistency notes before
//! tightening this.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::entry::{LedgerEntry, NewEntry};
use super::store::LedgerStore;
use crate::directory::AccountDirectory;
use crate::error::BankError;

pub struct TransferEngine {
    store: Arc<LedgerStore>,
    directory: Arc<AccountDirectory>,
    /// The bank's own lending account. Loans originate here, repayments,
    /// fees and interest flow back here. Allowed to go negative.
    lending_account: Uuid,
}

/// One outstanding or settled loan of a customer, with its repayments.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSummary {
    pub loan_id: Uuid,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub comment: Option<String>,
    pub current_balance: Decimal,
    pub to_account: Uuid,
    pub repayments: Vec<LedgerEntry>,
}

impl TransferEngine {
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

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn lending_account(&self) -> Uuid {
        self.lending_account
    }

    /// Transfer `amount` from `origin` to `destination`.
    ///
    /// Both accounts must resolve in the directory; the error names the
    /// missing side. The origin must cover the amount at the time of the
    /// balance read.
    pub fn transfer(
        &self,
        origin: Uuid,
        destination: Uuid,
        amount: Decimal,
        comment: Option<String>,
        loan_ref: Option<Uuid>,
        months: Option<u32>,
    ) -> Result<LedgerEntry, BankError> {
        if origin == destination {
            return Err(BankError::SameAccount(origin));
        }
        if self.directory.resolve_account(origin).is_none() {
            return Err(BankError::AccountNotFound(origin));
        }
        if self.directory.resolve_account(destination).is_none() {
            return Err(BankError::AccountNotFound(destination));
        }

        let balance = self.store.balance_of(origin);
        if balance < amount {
            return Err(BankError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        self.store.append(NewEntry {
            transaction_id: None,
            origin,
            destination,
            amount,
            loan_ref,
            months_remaining: months,
            comment,
        })
    }

    /// Issue a loan from the bank's lending account to `account`.
    ///
    /// Gated on rank (Silver/Gold) and account ownership. Appends directly,
    /// bypassing the funds check: the lending account legitimately goes
    /// negative as loans are issued.
    pub fn issue_loan(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        amount: Decimal,
        comment: &str,
    ) -> Result<LedgerEntry, BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::NonPositiveAmount(amount));
        }
        let rank = self
            .directory
            .rank_of(customer_id)
            .ok_or(BankError::AccountNotFound(customer_id))?;
        if !rank.may_borrow() {
            return Err(BankError::WrongRank(rank));
        }
        if !self.directory.owns_account(customer_id, account_id) {
            return Err(BankError::NotOwnAccount);
        }

        self.store.append(
            NewEntry::transfer(self.lending_account, account_id, amount)
                .with_comment(format!("Bank Loan-({comment})")),
        )
    }

    /// Repay `amount` of the loan `loan_id` from `account_id`.
    ///
    /// The loan must appear in the account's own history, and the repayment
    /// may not exceed the outstanding loan balance. With `months` set the
    /// repayment becomes a recurring installment replayed by the scheduler.
    pub fn repay_loan(
        &self,
        customer_id: Uuid,
        account_id: Uuid,
        loan_id: Uuid,
        amount: Decimal,
        months: Option<u32>,
    ) -> Result<LedgerEntry, BankError> {
        if amount <= Decimal::ZERO {
            return Err(BankError::NonPositiveAmount(amount));
        }
        if !self.directory.owns_account(customer_id, account_id) {
            return Err(BankError::NotOwnAccount);
        }

        let in_history = self
            .store
            .history_of(account_id)
            .iter()
            .any(|e| e.transaction_id == loan_id);
        if !in_history {
            return Err(BankError::InvalidLoan(loan_id));
        }

        let outstanding = self.store.loan_balance(loan_id)?;
        if amount > outstanding {
            return Err(BankError::ExcessRepayment {
                outstanding,
                requested: amount,
            });
        }

        self.transfer(
            account_id,
            self.lending_account,
            amount,
            Some("Loan Repayment".to_string()),
            Some(loan_id),
            months,
        )
    }

    /// All loans issued to any of the customer's accounts, with repayment
    /// detail and the current outstanding balance per loan.
    pub fn loans_of(&self, customer_id: Uuid) -> Vec<LoanSummary> {
        let mut summaries = Vec::new();
        for account in self.directory.accounts_of(customer_id) {
            let loans = self
                .store
                .history_of(account.account_id)
                .into_iter()
                .filter(|e| e.is_loan_from(self.lending_account) && e.destination == account.account_id);
            for loan in loans {
                let current_balance = self
                    .store
                    .loan_balance(loan.transaction_id)
                    .unwrap_or(Decimal::ZERO);
                let repayments = self
                    .store
                    .history_of(account.account_id)
                    .into_iter()
                    .filter(|e| e.loan_ref == Some(loan.transaction_id))
                    .collect();
                summaries.push(LoanSummary {
                    loan_id: loan.transaction_id,
                    amount: loan.amount,
                    date: loan.created_at,
                    comment: loan.comment.clone(),
                    current_balance,
                    to_account: account.account_id,
                    repayments,
                });
            }
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CustomerRank;

    struct Fixture {
        engine: TransferEngine,
        directory: Arc<AccountDirectory>,
        store: Arc<LedgerStore>,
        bank_account: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(LedgerStore::new());
        let directory = Arc::new(AccountDirectory::new());
        let bank = directory.add_customer("bank@bank.example", CustomerRank::Gold);
        let bank_account = directory
            .add_account(bank.customer_id, "Bank Lending Account")
            .account_id;
        let engine = TransferEngine::new(store.clone(), directory.clone(), bank_account);
        Fixture {
            engine,
            directory,
            store,
            bank_account,
        }
    }

    fn customer_with_funds(
        fx: &Fixture,
        rank: CustomerRank,
        funds: i64,
    ) -> (Uuid, Uuid) {
        let customer = fx.directory.add_customer("c@example.com", rank);
        let account = fx.directory.add_account(customer.customer_id, "Main Account");
        if funds > 0 {
            fx.store
                .append(NewEntry::transfer(
                    Uuid::new_v4(),
                    account.account_id,
                    Decimal::from(funds),
                ))
                .unwrap();
        }
        (customer.customer_id, account.account_id)
    }

    #[test]
    fn test_simple_transfer_moves_funds() {
        let fx = fixture();
        let (_, origin) = customer_with_funds(&fx, CustomerRank::Base, 1000);
        let (_, dest) = customer_with_funds(&fx, CustomerRank::Base, 0);

        let entry = fx
            .engine
            .transfer(origin, dest, Decimal::from(600), None, None, None)
            .unwrap();

        assert_eq!(entry.amount, Decimal::from(600));
        assert_eq!(fx.store.balance_of(origin), Decimal::from(400));
        assert_eq!(fx.store.balance_of(dest), Decimal::from(600));
    }

    #[test]
    fn test_overdraft_rejected_without_side_effect() {
        let fx = fixture();
        let (_, origin) = customer_with_funds(&fx, CustomerRank::Base, 400);
        let (_, dest) = customer_with_funds(&fx, CustomerRank::Base, 0);

        let err = fx
            .engine
            .transfer(origin, dest, Decimal::from(500), None, None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            BankError::InsufficientFunds { balance, requested }
                if balance == Decimal::from(400) && requested == Decimal::from(500)
        ));
        assert_eq!(fx.store.balance_of(origin), Decimal::from(400));
    }

    #[test]
    fn test_same_account_transfer_rejected() {
        let fx = fixture();
        let (_, origin) = customer_with_funds(&fx, CustomerRank::Base, 1000);
        let err = fx
            .engine
            .transfer(origin, origin, Decimal::from(1), None, None, None)
            .unwrap_err();
        assert!(matches!(err, BankError::SameAccount(_)));
        assert_eq!(fx.store.len(), 1);
    }

    #[test]
    fn test_transfer_names_the_missing_account() {
        let fx = fixture();
        let (_, origin) = customer_with_funds(&fx, CustomerRank::Base, 1000);
        let ghost = Uuid::new_v4();
        let err = fx
            .engine
            .transfer(origin, ghost, Decimal::from(1), None, None, None)
            .unwrap_err();
        assert!(matches!(err, BankError::AccountNotFound(id) if id == ghost));
    }

    #[test]
    fn test_loan_lifecycle() {
        let fx = fixture();
        let (customer, account) = customer_with_funds(&fx, CustomerRank::Gold, 0);

        let loan = fx
            .engine
            .issue_loan(customer, account, Decimal::from(10_000), "house")
            .unwrap();
        assert_eq!(
            fx.store.loan_balance(loan.transaction_id).unwrap(),
            Decimal::from(10_000)
        );
        assert_eq!(fx.store.balance_of(account), Decimal::from(10_000));
        assert_eq!(fx.store.balance_of(fx.bank_account), Decimal::from(-10_000));

        fx.engine
            .repay_loan(customer, account, loan.transaction_id, Decimal::from(1_000), None)
            .unwrap();
        assert_eq!(
            fx.store.loan_balance(loan.transaction_id).unwrap(),
            Decimal::from(9_000)
        );
        assert_eq!(fx.store.balance_of(account), Decimal::from(9_000));

        let err = fx
            .engine
            .repay_loan(
                customer,
                account,
                loan.transaction_id,
                Decimal::from(20_000),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, BankError::ExcessRepayment { outstanding, .. }
            if outstanding == Decimal::from(9_000)));
        assert_eq!(fx.store.balance_of(account), Decimal::from(9_000));
    }

    #[test]
    fn test_base_rank_may_not_borrow() {
        let fx = fixture();
        let (customer, account) = customer_with_funds(&fx, CustomerRank::Base, 0);
        let err = fx
            .engine
            .issue_loan(customer, account, Decimal::from(100), "no")
            .unwrap_err();
        assert!(matches!(err, BankError::WrongRank(CustomerRank::Base)));
        assert!(fx.store.is_empty());
    }

    #[test]
    fn test_loan_requires_own_account() {
        let fx = fixture();
        let (customer, _) = customer_with_funds(&fx, CustomerRank::Gold, 0);
        let (_, other_account) = customer_with_funds(&fx, CustomerRank::Base, 0);
        let err = fx
            .engine
            .issue_loan(customer, other_account, Decimal::from(100), "nope")
            .unwrap_err();
        assert!(matches!(err, BankError::NotOwnAccount));
    }

    #[test]
    fn test_repay_unknown_loan_is_invalid() {
        let fx = fixture();
        let (customer, account) = customer_with_funds(&fx, CustomerRank::Gold, 500);
        let ghost = Uuid::new_v4();
        let err = fx
            .engine
            .repay_loan(customer, account, ghost, Decimal::from(100), None)
            .unwrap_err();
        assert!(matches!(err, BankError::InvalidLoan(id) if id == ghost));
    }

    #[test]
    fn test_loans_of_summarizes_repayments() {
        let fx = fixture();
        let (customer, account) = customer_with_funds(&fx, CustomerRank::Silver, 0);
        let loan = fx
            .engine
            .issue_loan(customer, account, Decimal::from(5_000), "car")
            .unwrap();
        fx.engine
            .repay_loan(customer, account, loan.transaction_id, Decimal::from(500), None)
            .unwrap();

        let loans = fx.engine.loans_of(customer);
        assert_eq!(loans.len(), 1);
        let summary = &loans[0];
        assert_eq!(summary.loan_id, loan.transaction_id);
        assert_eq!(summary.current_balance, Decimal::from(4_500));
        assert_eq!(summary.repayments.len(), 1);
        assert_eq!(summary.repayments[0].amount, Decimal::from(500));
    }
}
