//! Cross-node transfer broker
//!
//! Saga-style coordination of transfers split across two independently
//! owned ledgers: balance verification, parallel leg commits under a
//! shared transaction id, and best-effort compensation with bounded retry
//! budgets.

pub mod coordinator;
pub mod peer;
pub mod state;

pub use coordinator::{BrokerCoordinator, CrossNodeRequest};
pub use peer::{HttpPeerBank, PeerBank, PeerError, RetryBudget};
pub use state::BrokerState;
