//! Ledger engine
//!
//! The append-only transaction log and everything derived from it:
//! balances, histories, loan balances, the transfer/loan operations, and
//! the periodic accrual sweeps.

pub mod accrual;
pub mod engine;
pub mod entry;
pub mod store;

pub use accrual::AccrualSweeps;
pub use engine::{LoanSummary, TransferEngine};
pub use entry::{LedgerEntry, NewEntry};
pub use store::LedgerStore;
