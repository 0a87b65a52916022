//! Uniform `{status, timestamp, ...}` result envelope.
//!
//! Every outward-facing result is one of:
//! ```text
//! {"status": "success", "timestamp": "...", <payload fields>}
//! {"status": "error",   "timestamp": "...", "kind": "...", "error": "...", "details"?: {...}}
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Tagged success/error result with a timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success {
        timestamp: DateTime<Utc>,
        #[serde(flatten)]
        payload: T,
    },
    Error {
        timestamp: DateTime<Utc>,
        kind: &'static str,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl<T> Envelope<T> {
    pub fn success(payload: T) -> Self {
        Envelope::Success {
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn failure(err: &OrchestratorError) -> Self {
        let details = match err {
            OrchestratorError::UnexpectedStatus {
                transaction_id,
                status,
            } => Some(json!({ "transaction_id": transaction_id, "transaction_status": status })),
            OrchestratorError::Api { status, .. } => Some(json!({ "http_status": status })),
            _ => None,
        };

        Envelope::Error {
            timestamp: Utc::now(),
            kind: err.kind(),
            error: err.to_string(),
            details,
        }
    }

    pub fn from_result(result: OrchestratorResult<T>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Envelope::Error { error, .. } => Some(error),
            Envelope::Success { .. } => None,
        }
    }
}
