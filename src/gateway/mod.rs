//! Node HTTP gateway
//!
//! Axum router for the node API: the peer-facing routes driven by remote
//! coordinators, plus the node-local transfer and loan operations. There is
//! no separate internal surface.

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::broker::BrokerCoordinator;
use crate::directory::AccountDirectory;
use crate::ledger::{LedgerStore, TransferEngine};

/// Shared gateway state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
    pub directory: Arc<AccountDirectory>,
    pub engine: Arc<TransferEngine>,
    pub broker: Arc<BrokerCoordinator>,
}

impl AppState {
    pub fn new(
        store: Arc<LedgerStore>,
        directory: Arc<AccountDirectory>,
        engine: Arc<TransferEngine>,
        broker: Arc<BrokerCoordinator>,
    ) -> Self {
        Self {
            store,
            directory,
            engine,
            broker,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Peer-facing: balance query, leg commit, leg delete, ingress
        .route("/balance/{account_id}", get(handlers::get_balance))
        .route("/transfer-funds", post(handlers::transfer_funds))
        .route(
            "/transaction/{transaction_id}",
            delete(handlers::delete_transaction),
        )
        .route("/transaction", post(handlers::incoming_transaction))
        // Node-local: transfer engine operations
        .route("/transfer", post(handlers::local_transfer))
        .route("/loan", post(handlers::issue_loan))
        .route("/loan/repay", post(handlers::repay_loan))
        .route("/loans/{customer_id}", get(handlers::list_loans))
        .with_state(state)
}

/// Bind and serve the gateway until the process exits.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
