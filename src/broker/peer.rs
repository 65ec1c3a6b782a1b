//! Peer bank client
//!
//! Outbound HTTP calls to a bank node's peer-facing endpoints (balance
//! query, leg commit, leg delete), behind a trait so the coordinator can be
//! exercised against mock peers in tests.
//!
//! Failures are split into two classes: `Fatal` (the peer answered and
//! said no — a validation-class reply) and `Retryable` (timeout, transport
//! error, or a server-side error where the outcome is unknown). Only
//! retryable failures consume retry budget.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::gateway::types::{ErrorBody, OkBody, TransferFundsRequest};
use crate::ledger::LedgerEntry;

#[derive(Debug, Clone, Error)]
pub enum PeerError {
    /// The peer responded with a non-recoverable rejection. Retrying the
    /// same request will not change the answer.
    #[error("{0}")]
    Fatal(String),

    /// Timeout, transport failure, or server-side error; the outcome on
    /// the peer is unknown and the call may be retried.
    #[error("{0}")]
    Retryable(String),
}

/// Fixed-delay retry budget. Delays are deliberately not exponential; both
/// budgets are small and bounded.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryBudget {
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self {
            attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Re-invoke `op` until it succeeds, fails fatally, or the budget runs out.
/// There is no cancellation: once started, the sequence runs to exhaustion.
pub async fn with_retries<T, F, Fut>(
    budget: RetryBudget,
    what: &str,
    mut op: F,
) -> Result<T, PeerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PeerError>>,
{
    let mut last = String::new();
    for attempt in 1..=budget.attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(PeerError::Fatal(detail)) => {
                warn!(what, attempt, detail, "Peer rejected request, not retrying");
                return Err(PeerError::Fatal(detail));
            }
            Err(PeerError::Retryable(detail)) => {
                warn!(what, attempt, detail, "Peer call failed, will retry");
                last = detail;
                if attempt < budget.attempts {
                    tokio::time::sleep(budget.delay).await;
                }
            }
        }
    }
    Err(PeerError::Retryable(last))
}

#[async_trait]
pub trait PeerBank: Send + Sync {
    /// `GET {base}/balance/{account_id}`
    async fn balance(&self, base_url: &str, account_id: Uuid) -> Result<Decimal, PeerError>;

    /// `POST {base}/transfer-funds` — append one leg under the shared
    /// transaction id. Idempotent on the peer.
    async fn commit_leg(
        &self,
        base_url: &str,
        leg: &TransferFundsRequest,
    ) -> Result<LedgerEntry, PeerError>;

    /// `DELETE {base}/transaction/{transaction_id}` — compensation. A
    /// missing entry on the peer is success, not an error.
    async fn delete_leg(&self, base_url: &str, transaction_id: Uuid) -> Result<(), PeerError>;
}

/// Production peer client over HTTP. The request timeout is short and
/// distinct from the coordinator's retry delays; a timeout counts as one
/// retryable failure.
pub struct HttpPeerBank {
    client: reqwest::Client,
}

impl HttpPeerBank {
    pub fn new(timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    /// Pull an `{"error", "detail"}` payload out of a non-200 reply, fall
    /// back to the raw body.
    async fn error_detail(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => format!("{} ({}): {}", err.error, status, err.detail),
            Err(_) => format!("HTTP {status}: {body}"),
        }
    }

    async fn classify<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PeerError> {
        let status = response.status();
        if status == StatusCode::OK {
            let body: OkBody<T> = response
                .json()
                .await
                .map_err(|e| PeerError::Fatal(format!("Malformed peer reply: {e}")))?;
            return Ok(body.ok);
        }
        let detail = Self::error_detail(response).await;
        if status.is_client_error() {
            Err(PeerError::Fatal(detail))
        } else {
            Err(PeerError::Retryable(detail))
        }
    }

    fn transport_error(e: reqwest::Error) -> PeerError {
        PeerError::Retryable(e.to_string())
    }
}

#[async_trait]
impl PeerBank for HttpPeerBank {
    async fn balance(&self, base_url: &str, account_id: Uuid) -> Result<Decimal, PeerError> {
        let response = self
            .client
            .get(format!("{base_url}/balance/{account_id}"))
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::classify(response).await
    }

    async fn commit_leg(
        &self,
        base_url: &str,
        leg: &TransferFundsRequest,
    ) -> Result<LedgerEntry, PeerError> {
        let response = self
            .client
            .post(format!("{base_url}/transfer-funds"))
            .json(leg)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::classify(response).await
    }

    async fn delete_leg(&self, base_url: &str, transaction_id: Uuid) -> Result<(), PeerError> {
        let response = self
            .client
            .delete(format!("{base_url}/transaction/{transaction_id}"))
            .send()
            .await
            .map_err(Self::transport_error)?;
        // Body is a fixed confirmation string, only the status matters.
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let detail = Self::error_detail(response).await;
        if status.is_client_error() {
            Err(PeerError::Fatal(detail))
        } else {
            Err(PeerError::Retryable(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_with_retries_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries(RetryBudget::new(3, 1), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(PeerError::Retryable("flaky".into()))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retries_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(RetryBudget::new(3, 1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PeerError::Retryable("down".into())) }
        })
        .await;
        assert!(matches!(result, Err(PeerError::Retryable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retries_stops_on_fatal() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(RetryBudget::new(5, 1), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PeerError::Fatal("rejected".into())) }
        })
        .await;
        assert!(matches!(result, Err(PeerError::Fatal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
