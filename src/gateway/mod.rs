//! Wallet service gateway.
//!
//! # Data Flow
//! ```text
//! orchestrator call
//!     → client.rs (URL, API key header, request id, timeout)
//!     → wallet service (HTTP JSON)
//!     → client.rs (status check, error normalization, decode)
//!     → types.rs records, or OrchestratorError
//!
//! At the outer boundary:
//!     OrchestratorResult<T> → envelope.rs → {status, timestamp, ...}
//! ```
//!
//! # Design Decisions
//! - Stateless: every call stands alone, nothing is cached
//! - Every remote failure becomes an `OrchestratorError` here; nothing above
//!   this layer sees transport types
//! - Input is validated before a request is built

pub mod client;
pub mod envelope;
pub mod types;

pub use client::WalletGateway;
pub use envelope::Envelope;
pub use types::{Approval, Call, TransactionRecord, WalletKind, WalletRecord};
