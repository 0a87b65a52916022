//! Smart wallet transaction orchestration library

pub mod blockchain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod observability;
pub mod orchestrator;
pub mod registry;
pub mod resilience;

pub use config::schema::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use gateway::{Envelope, WalletGateway};
pub use orchestrator::TransactionOrchestrator;
pub use registry::WalletRegistry;
