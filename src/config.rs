use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub bank: BankConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub accrual: AccrualConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// The node's own banking identity: the customer record the bank operates
/// under and the lending account loans are issued from. Fixed ids so that
/// peer deployments and fixtures agree on them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BankConfig {
    pub customer_id: Uuid,
    pub lending_account_id: Uuid,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            customer_id: Uuid::parse_str("40c49b66-8eb1-499b-a914-48f60dd48b7b")
                .expect("valid bank customer uuid"),
            lending_account_id: Uuid::parse_str("5bc6860e-61c2-4427-b9d8-b21c80c8370d")
                .expect("valid bank account uuid"),
        }
    }
}

/// Retry budgets and peer timeout for cross-node coordination. Commit legs
/// get a small budget; compensation gets a larger one to maximize eventual
/// convergence.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrokerConfig {
    pub peer_timeout_ms: u64,
    pub commit_attempts: u32,
    pub commit_delay_ms: u64,
    pub compensate_attempts: u32,
    pub compensate_delay_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            peer_timeout_ms: 2_000,
            commit_attempts: 3,
            commit_delay_ms: 2_000,
            compensate_attempts: 5,
            compensate_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccrualConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 86_400,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
