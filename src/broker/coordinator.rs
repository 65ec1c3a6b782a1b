//! Cross-node transfer coordinator
//!
//! Orchestrates a transfer whose origin and destination accounts live on
//! two different bank nodes. Saga-style: verify both balances up front,
//! commit one ledger entry per node under a shared transaction id, and on
//! partial failure issue compensating deletes to both nodes.
//!
//! There is no cross-node lock between the two leg commits; a concurrent
//! balance read can observe one committed leg without the other. And
//! compensation itself is best effort: a persistently unreachable node can
//! be left holding a committed leg, which is surfaced as a terminal
//! failure rather than retried forever.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::peer::{PeerBank, PeerError, RetryBudget, with_retries};
use super::state::BrokerState;
use crate::config::BrokerConfig;
use crate::error::BankError;
use crate::gateway::types::TransferFundsRequest;
use crate::ledger::{LedgerEntry, LedgerStore};

/// A validated cross-node transfer request. `own_*` is the side the request
/// arrived on; both sides are still driven over their peer-facing HTTP
/// endpoints so the two legs take the same code path.
#[derive(Debug, Clone)]
pub struct CrossNodeRequest {
    pub transaction_id: Uuid,
    pub own_bank_ip: String,
    pub other_bank_ip: String,
    pub own_account_id: Uuid,
    pub other_account_id: Uuid,
    pub amount: Decimal,
    pub comment: Option<String>,
}

pub struct BrokerCoordinator {
    peer: Arc<dyn PeerBank>,
    store: Arc<LedgerStore>,
    states: DashMap<Uuid, BrokerState>,
    commit_budget: RetryBudget,
    compensate_budget: RetryBudget,
}

impl BrokerCoordinator {
    pub fn new(peer: Arc<dyn PeerBank>, store: Arc<LedgerStore>, cfg: &BrokerConfig) -> Self {
        Self {
            peer,
            store,
            states: DashMap::new(),
            commit_budget: RetryBudget::new(cfg.commit_attempts, cfg.commit_delay_ms),
            compensate_budget: RetryBudget::new(cfg.compensate_attempts, cfg.compensate_delay_ms),
        }
    }

    /// Current FSM state of a transfer, if this coordinator has seen it.
    pub fn state_of(&self, transaction_id: Uuid) -> Option<BrokerState> {
        self.states.get(&transaction_id).map(|s| *s)
    }

    fn set_state(&self, transaction_id: Uuid, state: BrokerState) {
        info!(%transaction_id, state = %state, "Broker state transition");
        self.states.insert(transaction_id, state);
    }

    /// Run the full protocol for one request. Returns the committed entry
    /// records of both legs on success.
    pub async fn execute(&self, req: CrossNodeRequest) -> Result<Vec<LedgerEntry>, BankError> {
        let txid = req.transaction_id;
        self.set_state(txid, BrokerState::Received);

        if req.amount <= Decimal::ZERO {
            self.set_state(txid, BrokerState::Rejected);
            return Err(BankError::NonPositiveAmount(req.amount));
        }

        // Both home nodes must answer before any write. This doubles as the
        // existence check for both accounts.
        let (own_balance, other_balance) = tokio::join!(
            self.peer.balance(&req.own_bank_ip, req.own_account_id),
            self.peer.balance(&req.other_bank_ip, req.other_account_id),
        );
        let own_balance = match own_balance {
            Ok(balance) => balance,
            Err(e) => {
                self.set_state(txid, BrokerState::Rejected);
                return Err(balance_failure(req.own_account_id, &req.own_bank_ip, e));
            }
        };
        if let Err(e) = other_balance {
            self.set_state(txid, BrokerState::Rejected);
            return Err(balance_failure(req.other_account_id, &req.other_bank_ip, e));
        }

        if own_balance < req.amount {
            self.set_state(txid, BrokerState::Rejected);
            return Err(BankError::InsufficientFunds {
                balance: own_balance,
                requested: req.amount,
            });
        }
        self.set_state(txid, BrokerState::BalanceVerified);

        // Idempotency: a duplicate invocation (caller retry after a lost
        // success reply) returns the already-recorded local leg instead of
        // re-committing. The remote leg is trusted, not re-confirmed.
        if let Some(existing) = self.store.get(txid) {
            info!(transaction_id = %txid, "Duplicate transfer id, returning recorded entry");
            self.set_state(txid, BrokerState::Committed);
            return Ok(vec![existing]);
        }

        let leg = TransferFundsRequest {
            transaction_id: txid,
            origin_id: req.own_account_id,
            destination_id: req.other_account_id,
            amount: req.amount.to_string(),
            comment: req.comment.clone(),
        };

        self.set_state(txid, BrokerState::LegsCommitting);
        let (own_leg, other_leg) = tokio::join!(
            with_retries(self.commit_budget, "origin leg commit", || {
                self.peer.commit_leg(&req.own_bank_ip, &leg)
            }),
            with_retries(self.commit_budget, "destination leg commit", || {
                self.peer.commit_leg(&req.other_bank_ip, &leg)
            }),
        );

        match (own_leg, other_leg) {
            (Ok(own_entry), Ok(other_entry)) => {
                self.set_state(txid, BrokerState::Committed);
                info!(transaction_id = %txid, "Both legs committed");
                Ok(vec![own_entry, other_entry])
            }
            (own_result, other_result) => {
                let failed = describe_failed_legs(&own_result, &other_result);
                warn!(transaction_id = %txid, failed, "Leg commit failed, compensating");
                self.compensate(&req).await;
                Err(BankError::TransferAborted(failed))
            }
        }
    }

    /// Delete-by-transaction-id on both nodes, each with the larger retry
    /// budget. A node that never answers is logged and given up on.
    async fn compensate(&self, req: &CrossNodeRequest) {
        let txid = req.transaction_id;
        self.set_state(txid, BrokerState::Compensating);

        let (own, other) = tokio::join!(
            with_retries(self.compensate_budget, "origin leg delete", || {
                self.peer.delete_leg(&req.own_bank_ip, txid)
            }),
            with_retries(self.compensate_budget, "destination leg delete", || {
                self.peer.delete_leg(&req.other_bank_ip, txid)
            }),
        );
        if let Err(e) = own {
            error!(transaction_id = %txid, bank = %req.own_bank_ip, error = %e,
                "Compensation did not reach origin node; a committed leg may remain");
        }
        if let Err(e) = other {
            error!(transaction_id = %txid, bank = %req.other_bank_ip, error = %e,
                "Compensation did not reach destination node; a committed leg may remain");
        }

        self.set_state(txid, BrokerState::Compensated);
    }
}

fn balance_failure(account_id: Uuid, bank: &str, e: PeerError) -> BankError {
    match e {
        // The peer answered and rejected the lookup: the account is absent.
        PeerError::Fatal(_) => BankError::AccountNotFound(account_id),
        PeerError::Retryable(detail) => BankError::PeerUnavailable(format!(
            "Bank '{bank}' did not answer a balance query for account '{account_id}': {detail}"
        )),
    }
}

fn describe_failed_legs(
    own: &Result<LedgerEntry, PeerError>,
    other: &Result<LedgerEntry, PeerError>,
) -> String {
    let mut parts = Vec::new();
    if let Err(e) = own {
        parts.push(format!("origin leg: {e}"));
    }
    if let Err(e) = other {
        parts.push(format!("destination leg: {e}"));
    }
    parts.join("; ")
}
