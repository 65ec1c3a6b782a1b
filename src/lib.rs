//! crossledger - Append-only bank ledger with a cross-node transfer broker
//!
//! Each node owns an immutable transaction log from which all account and
//! loan balances are derived. Transfers that span two nodes are driven by
//! a saga-style coordinator: verify both balances, commit one ledger entry
//! per node under a shared transaction id, compensate on partial failure.
//!
//! # Modules
//!
//! - [`money`] - Fixed-point (2 dp) amount parsing and scaling
//! - [`error`] - The `BankError` taxonomy with wire codes and HTTP statuses
//! - [`directory`] - Customers, accounts, ranks; ownership and rank lookups
//! - [`ledger`] - Entry log, derived balances, transfer/loan engine, sweeps
//! - [`broker`] - Cross-node coordinator, peer client, saga FSM
//! - [`gateway`] - Peer-facing axum API
//! - [`config`] / [`logging`] - YAML config and tracing setup

pub mod broker;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod money;

// Convenient re-exports at crate root
pub use broker::{BrokerCoordinator, BrokerState, CrossNodeRequest, HttpPeerBank, PeerBank};
pub use config::AppConfig;
pub use directory::{Account, AccountDirectory, Customer, CustomerRank};
pub use error::BankError;
pub use ledger::{AccrualSweeps, LedgerEntry, LedgerStore, LoanSummary, NewEntry, TransferEngine};
