//! Environment-driven configuration.

use std::env;
use std::time::Duration;

use anyhow::Context;

/// Public Sui testnet fullnode, used when `SUI_RPC_URL` is not set.
pub const DEFAULT_RPC_URL: &str = "https://fullnode.testnet.sui.io:443";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_RETRY_INTERVAL_MS: u64 = 5000;

const REQUIRED_VARS: [&str; 2] = ["DATABASE_URL", "AUCTION_PACKAGE_ID"];

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Sui fullnode JSON-RPC endpoint
    pub rpc_url: String,
    /// Postgres connection string for the projection database
    pub database_url: String,
    /// Package id of the deployed auction contract
    pub package_id: String,
    /// Pause between successful ingestion iterations
    pub poll_interval: Duration,
    /// Pause after a failed iteration
    pub retry_interval: Duration,
    /// Page size for event queries; `None` uses the node's default
    pub page_size: Option<usize>,
}

impl IndexerConfig {
    /// Read configuration from the process environment, consulting `.env`
    /// when a required variable is absent.
    pub fn from_env() -> anyhow::Result<Self> {
        if REQUIRED_VARS.iter().any(|var| env::var(var).is_err()) {
            if let Err(e) = dotenvy::dotenv() {
                tracing::debug!("No .env file loaded: {}", e);
            }
        }

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let package_id = env::var("AUCTION_PACKAGE_ID").context("AUCTION_PACKAGE_ID is not set")?;
        let rpc_url = env::var("SUI_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

        Ok(Self {
            rpc_url,
            database_url,
            package_id,
            poll_interval: Duration::from_millis(env_u64(
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            retry_interval: Duration::from_millis(env_u64(
                "RETRY_INTERVAL_MS",
                DEFAULT_RETRY_INTERVAL_MS,
            )),
            page_size: env::var("EVENT_PAGE_SIZE").ok().and_then(|s| s.parse().ok()),
        })
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
