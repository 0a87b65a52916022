//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Wallet service connection settings.
    pub gateway: GatewayConfig,

    /// Admin signer identity.
    pub signer: SignerConfig,

    /// Tracked token and chain defaults.
    pub asset: AssetConfig,

    /// Settlement polling behaviour.
    pub polling: PollingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Wallet service connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// API root, e.g. "https://staging.crossmint.com/api".
    pub base_url: String,

    /// Server API key. Usually supplied via `CROSSMINT_SERVER_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Honour HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://staging.crossmint.com/api".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            use_system_proxy: true,
        }
    }
}

/// Admin signer identity. The private key is only ever read from the
/// environment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignerConfig {
    /// Public address of the admin signer (`SIGNER_ADDRESS`).
    pub address: String,
}

/// The token this crate moves around.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Symbol matched against the wallet service's token list.
    pub symbol: String,

    /// Decimals of the token.
    pub decimals: u8,

    /// ERC20 contract that transfers are sent to.
    pub contract_address: String,

    /// Currency code the faucet expects.
    pub faucet_currency: String,

    /// Chain used when the caller does not name one.
    pub default_chain: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            symbol: "USDC".to_string(),
            decimals: 6,
            contract_address: "0x14196F08a4Fa0B66B7331bC40dd6bCd8A1dEeA9F".to_string(),
            faucet_currency: "usdxm".to_string(),
            default_chain: "base-sepolia".to_string(),
        }
    }
}

/// Settlement polling: a settle delay, then exponential backoff with jitter,
/// bounded by attempts and wall-clock time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Wait before the first poll, in milliseconds.
    pub settle_delay_ms: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Maximum number of polls.
    pub max_attempts: u32,

    /// Overall deadline in seconds.
    pub timeout_secs: u64,
}

impl PollingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2_000,
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            max_attempts: 12,
            timeout_secs: 90,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
