//! crossledger node entry point
//!
//! One process per bank node: a ledger store, the peer-facing gateway, a
//! broker coordinator for cross-node transfers, and (optionally) the
//! accrual scheduler sweeping fees, interest, and recurring payments.

use std::sync::Arc;

use tracing::info;

use crossledger::broker::{BrokerCoordinator, HttpPeerBank};
use crossledger::config::AppConfig;
use crossledger::directory::{AccountDirectory, CustomerRank};
use crossledger::gateway::{self, AppState};
use crossledger::ledger::{AccrualSweeps, LedgerStore, TransferEngine, accrual};
use crossledger::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(&get_env());
    let _guard = init_logging(&config);

    let port = get_port_override().unwrap_or(config.gateway.port);
    info!("Starting crossledger node on {}:{}", config.gateway.host, port);

    let store = Arc::new(LedgerStore::new());
    let directory = Arc::new(AccountDirectory::new());

    // The node's own banking identity; loans originate from this account.
    directory.add_customer_with_id(config.bank.customer_id, "bank@localhost", CustomerRank::Gold);
    directory.add_account_with_id(
        config.bank.lending_account_id,
        config.bank.customer_id,
        "Bank Lending Account",
    );

    let engine = Arc::new(TransferEngine::new(
        store.clone(),
        directory.clone(),
        config.bank.lending_account_id,
    ));

    if config.accrual.enabled {
        let sweeps = Arc::new(AccrualSweeps::new(
            store.clone(),
            directory.clone(),
            config.bank.lending_account_id,
        ));
        accrual::spawn_scheduler(sweeps, config.accrual.interval_secs);
        info!(
            "Accrual scheduler enabled, interval {}s",
            config.accrual.interval_secs
        );
    }

    let peer = Arc::new(HttpPeerBank::new(config.broker.peer_timeout_ms)?);
    let broker = Arc::new(BrokerCoordinator::new(peer, store.clone(), &config.broker));

    let state = Arc::new(AppState::new(store, directory, engine, broker));
    gateway::serve(state, &config.gateway.host, port).await
}
