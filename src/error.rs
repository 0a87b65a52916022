//! Error taxonomy shared by every subsystem.
//!
//! Remote failures are converted into [`OrchestratorError`] at the gateway
//! boundary; nothing above the gateway sees a `reqwest` error or a panic.

use thiserror::Error;

pub use crate::blockchain::types::SigningError;

/// Errors surfaced by the gateway, the orchestrator and the registry.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Input rejected before any network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection, DNS or timeout failure talking to the wallet service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP response. `message` is extracted best-effort.
    #[error("API Error: {message}")]
    Api { status: u16, message: String },

    /// HTTP 429. The remote message is passed through unwrapped.
    #[error("{0}")]
    RateLimited(String),

    /// The service created a transaction in a state other than
    /// `awaiting-approval`. The raw status is kept for diagnostics.
    #[error("Unexpected transaction status: {status}")]
    UnexpectedStatus {
        transaction_id: String,
        status: String,
    },

    /// A tracked transaction moved in a way the state machine forbids.
    #[error("Unexpected transaction state: {0}")]
    UnexpectedState(String),

    /// An approval for this signer was already recorded with different data.
    #[error("Approval conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Signing(#[from] SigningError),

    /// A success response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A bounded wait gave up.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A cancellable wait was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl OrchestratorError {
    /// Stable identifier for the failure class, used in envelopes and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "validation_error",
            OrchestratorError::Transport(_) => "transport_error",
            OrchestratorError::Api { .. } => "api_error",
            OrchestratorError::RateLimited(_) => "rate_limit_error",
            OrchestratorError::UnexpectedStatus { .. } => "unexpected_status",
            OrchestratorError::UnexpectedState(_) => "unexpected_state_error",
            OrchestratorError::Conflict(_) => "conflict",
            OrchestratorError::Signing(_) => "signing_error",
            OrchestratorError::MalformedResponse(_) => "malformed_response",
            OrchestratorError::Timeout(_) => "timeout",
            OrchestratorError::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            OrchestratorError::MalformedResponse(err.to_string())
        } else {
            OrchestratorError::Transport(err.to_string())
        }
    }
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
