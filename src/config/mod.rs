//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! walletctl.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (API key, signer address)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Secrets come from the environment; the private key is never read from a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AssetConfig, GatewayConfig, ObservabilityConfig, OrchestratorConfig, PollingConfig,
    SignerConfig,
};
