//! Configuration management for Pitwall
//!
//! Loads defaults + optional config files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub chain: ChainSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Chain ID (8453 = Base mainnet)
    pub chain_id: u64,
    /// Deployed prediction market contract
    pub market_address: String,
    /// USDC contract on Base
    pub token_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    /// Market snapshot refresh interval in seconds
    pub refresh_secs: u64,
    /// Number of markets shown in the volume listing
    pub volume_limit: usize,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Chain defaults
            .set_default("chain.rpc_url", "https://mainnet.base.org")?
            .set_default("chain.chain_id", 8453)?
            .set_default(
                "chain.market_address",
                "0x761f5fFf0F56149401D16706a528C46a20C4D6e0",
            )?
            .set_default(
                "chain.token_address",
                "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
            )?
            // Client defaults
            .set_default("client.refresh_secs", 30)?
            .set_default("client.volume_limit", 10)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PITWALL_*)
            .add_source(Environment::with_prefix("PITWALL").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "chain={} market={} refresh={}s",
            self.chain.chain_id, self.chain.market_address, self.client.refresh_secs
        )
    }

    /// Validate the signing key needed for write commands
    pub fn validate_signing_env(&self) -> Result<()> {
        let pk = std::env::var("PRIVATE_KEY")
            .context("Required environment variable PRIVATE_KEY is not set")?;
        if !pk.starts_with("0x") || pk.len() != 66 {
            bail!("PRIVATE_KEY must be a hex string with 0x prefix (66 chars total)");
        }
        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
