//! Wire types for the node-to-node API
//!
//! Every peer-facing response is wrapped in one of two envelopes:
//! `{"ok": ...}` on success, `{"error": <kind>, "detail": <text>}` on
//! failure. Amounts travel as strings to avoid float precision issues.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BankError;
use crate::ledger::LedgerEntry;

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkBody<T> {
    pub ok: T,
}

pub fn ok<T: Serialize>(value: T) -> Json<OkBody<T>> {
    Json(OkBody { ok: value })
}

/// Error envelope. `error` carries the taxonomy kind, `detail` the
/// human-readable explanation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.code().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Leg-commit request, `POST /transfer-funds`. Shared between the gateway
/// handler and the outbound peer client; idempotent on `transaction_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFundsRequest {
    pub transaction_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Coordinator ingress, `POST /transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub transaction_id: Uuid,
    pub own_bank_ip: String,
    pub other_bank_ip: String,
    pub own_account_id: Uuid,
    pub other_account_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Coordinator ingress success payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub status: String,
    pub transactions: Vec<LedgerEntry>,
}

/// Node-local transfer, `POST /transfer`. `customer_id` is the already-
/// authenticated caller; authentication itself lives outside this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalTransferRequest {
    pub customer_id: Uuid,
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Number of further monthly repeats, for recurring payments.
    #[serde(default)]
    pub months: Option<u32>,
}

/// Loan issuance, `POST /loan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer_id: Uuid,
    pub account_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Loan repayment, `POST /loan/repay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepayRequest {
    pub customer_id: Uuid,
    pub account_id: Uuid,
    pub loan_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub months: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes_round_trip() {
        let ok_json = serde_json::to_string(&OkBody { ok: "400.00" }).unwrap();
        assert_eq!(ok_json, r#"{"ok":"400.00"}"#);

        let err: ErrorBody = serde_json::from_str(
            r#"{"error":"NotFoundError","detail":"Account not found"}"#,
        )
        .unwrap();
        assert_eq!(err.error, "NotFoundError");
    }

    #[test]
    fn test_transfer_funds_request_accepts_missing_comment() {
        let req: TransferFundsRequest = serde_json::from_str(&format!(
            r#"{{"transaction_id":"{}","origin_id":"{}","destination_id":"{}","amount":"600"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        ))
        .unwrap();
        assert!(req.comment.is_none());
        assert_eq!(req.amount, "600");
    }
}
