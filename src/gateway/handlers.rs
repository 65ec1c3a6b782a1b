//! HTTP handlers
//!
//! The node-to-node endpoints (balance query, leg commit, leg delete,
//! coordinator ingress) and the node-local transfer and loan operations.
//! The accrual sweeps have no HTTP surface; the scheduler drives them
//! in-process.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use super::types::{
    LoanRequest, LocalTransferRequest, OkBody, RepayRequest, TransactionRequest,
    TransactionResponse, TransferFundsRequest, ok,
};
use crate::broker::CrossNodeRequest;
use crate::error::BankError;
use crate::ledger::{LedgerEntry, LoanSummary, NewEntry};
use crate::money;

/// `GET /balance/{account_id}` — read-only balance query, exposed to peer
/// nodes. The balance is derived from the full log on every call.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<OkBody<rust_decimal::Decimal>>, BankError> {
    if state.directory.resolve_account(account_id).is_none() {
        return Err(BankError::NotFound("Account not found".to_string()));
    }
    Ok(ok(state.store.balance_of(account_id)))
}

/// `POST /transfer-funds` — append one leg of a coordinated transfer.
///
/// Idempotent on `transaction_id`: a replayed commit returns the recorded
/// entry instead of failing. Deliberately performs no funds check; the
/// coordinator verified both balances before instructing any leg.
pub async fn transfer_funds(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferFundsRequest>,
) -> Result<Json<OkBody<LedgerEntry>>, BankError> {
    let amount = money::parse_amount(&req.amount)?;

    if let Some(existing) = state.store.get(req.transaction_id) {
        info!(transaction_id = %req.transaction_id, "Replayed leg commit, returning recorded entry");
        return Ok(ok(existing));
    }

    let entry = state.store.append(
        NewEntry {
            transaction_id: Some(req.transaction_id),
            origin: req.origin_id,
            destination: req.destination_id,
            amount,
            loan_ref: None,
            months_remaining: None,
            comment: req.comment,
        },
    )?;
    info!(transaction_id = %entry.transaction_id, "Leg committed");
    Ok(ok(entry))
}

/// `DELETE /transaction/{transaction_id}` — compensation target. Deleting
/// an entry that does not exist is a no-op, not an error, so a retried
/// compensation converges.
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<Uuid>,
) -> Json<OkBody<&'static str>> {
    match state.store.remove(transaction_id) {
        Ok(()) => info!(%transaction_id, "Transaction deleted by compensation"),
        Err(_) => info!(%transaction_id, "Compensation delete for absent transaction, no-op"),
    }
    ok("Transaction has been deleted")
}

/// `POST /transaction` — coordinator ingress. Runs the full cross-node
/// protocol and maps the outcome onto the ingress status codes.
pub async fn incoming_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransactionRequest>,
) -> Result<Json<TransactionResponse>, BankError> {
    info!(transaction_id = %req.transaction_id, "Received a cross-node transfer request");
    let amount = money::parse_amount(&req.amount)?;

    let transactions = state
        .broker
        .execute(CrossNodeRequest {
            transaction_id: req.transaction_id,
            own_bank_ip: req.own_bank_ip,
            other_bank_ip: req.other_bank_ip,
            own_account_id: req.own_account_id,
            other_account_id: req.other_account_id,
            amount,
            comment: req.comment,
        })
        .await?;

    Ok(Json(TransactionResponse {
        status: "success".to_string(),
        transactions,
    }))
}

/// `POST /transfer` — node-local transfer between two accounts of this
/// ledger. The caller must own the origin account.
pub async fn local_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LocalTransferRequest>,
) -> Result<Json<OkBody<LedgerEntry>>, BankError> {
    let amount = money::parse_amount(&req.amount)?;
    if !state.directory.owns_account(req.customer_id, req.origin_id) {
        return Err(BankError::NotOwnAccount);
    }
    let entry = state.engine.transfer(
        req.origin_id,
        req.destination_id,
        amount,
        req.comment,
        None,
        req.months,
    )?;
    Ok(ok(entry))
}

/// `POST /loan` — issue a loan from the bank's lending account.
pub async fn issue_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoanRequest>,
) -> Result<Json<OkBody<LedgerEntry>>, BankError> {
    let amount = money::parse_amount(&req.amount)?;
    let entry = state.engine.issue_loan(
        req.customer_id,
        req.account_id,
        amount,
        req.comment.as_deref().unwrap_or("Default"),
    )?;
    Ok(ok(entry))
}

/// `POST /loan/repay` — repay part of an outstanding loan.
pub async fn repay_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RepayRequest>,
) -> Result<Json<OkBody<LedgerEntry>>, BankError> {
    let amount = money::parse_amount(&req.amount)?;
    let entry = state.engine.repay_loan(
        req.customer_id,
        req.account_id,
        req.loan_id,
        amount,
        req.months,
    )?;
    Ok(ok(entry))
}

/// `GET /loans/{customer_id}` — the customer's loans with repayment detail.
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<OkBody<Vec<LoanSummary>>>, BankError> {
    if state.directory.resolve_customer(customer_id).is_none() {
        return Err(BankError::NotFound("Customer not found".to_string()));
    }
    Ok(ok(state.engine.loans_of(customer_id)))
}
