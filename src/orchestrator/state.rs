//! Transaction state machine.
//!
//! ```text
//! Created → AwaitingApproval → Submitted → Confirmed
//!    │             │               │
//!    └─────────────┴───────────────┴──────→ Failed
//! ```
//!
//! States never move backward and terminal states never change.

use std::fmt;

use serde::Serialize;

use crate::gateway::types::{Approval, Call, TransactionRecord};

/// Lifecycle state of an orchestrated transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Created,
    AwaitingApproval,
    Submitted,
    Confirmed,
    Failed,
}

impl TransactionState {
    /// Map a status string reported by the wallet service.
    pub fn from_remote(status: &str) -> Option<Self> {
        match status {
            "created" => Some(TransactionState::Created),
            "awaiting-approval" => Some(TransactionState::AwaitingApproval),
            "pending" | "submitted" => Some(TransactionState::Submitted),
            "success" | "confirmed" => Some(TransactionState::Confirmed),
            "failed" | "reverted" => Some(TransactionState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Confirmed | TransactionState::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            TransactionState::Created => 0,
            TransactionState::AwaitingApproval => 1,
            TransactionState::Submitted => 2,
            TransactionState::Confirmed | TransactionState::Failed => 3,
        }
    }

    /// Whether observing `next` after `self` is a legal move. Staying put is
    /// always legal.
    pub fn can_transition_to(self, next: TransactionState) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == TransactionState::Failed || next.rank() > self.rank()
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::Created => "created",
            TransactionState::AwaitingApproval => "awaiting_approval",
            TransactionState::Submitted => "submitted",
            TransactionState::Confirmed => "confirmed",
            TransactionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Snapshot of a transaction as last reported by the wallet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub wallet_address: String,
    pub chain: String,
    pub calls: Vec<Call>,
    /// `None` when the service reports a status this crate does not know.
    pub state: Option<TransactionState>,
    pub remote_status: String,
    pub user_operation_hash: Option<String>,
    pub pending_approvals: Vec<Approval>,
    pub submitted_approvals: Vec<Approval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onchain_tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Transaction {
    /// Build a snapshot. `chain` is used when the record does not echo its
    /// params back.
    pub fn from_record(wallet_address: &str, chain: &str, record: TransactionRecord) -> Self {
        let (chain, calls) = match record.params {
            Some(params) => (params.chain, params.calls),
            None => (chain.to_string(), Vec::new()),
        };

        Self {
            id: record.id,
            wallet_address: wallet_address.to_string(),
            chain,
            calls,
            state: TransactionState::from_remote(&record.status),
            remote_status: record.status,
            user_operation_hash: record.on_chain.user_operation_hash,
            pending_approvals: record.approvals.pending,
            submitted_approvals: record.approvals.submitted,
            onchain_tx_id: record.on_chain.tx_id,
            explorer_link: record.on_chain.explorer_link,
            created_at: record.created_at,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_some_and(TransactionState::is_terminal)
    }

    pub fn first_pending_signer(&self) -> Option<&str> {
        self.pending_approvals.first().map(|a| a.signer.as_str())
    }

    /// A submitted approval from `signer`, if any.
    pub fn submitted_by(&self, signer: &str) -> Option<&Approval> {
        self.submitted_approvals
            .iter()
            .find(|a| a.signer.eq_ignore_ascii_case(signer))
    }

    /// A submitted approval carrying `signature`, whoever sent it.
    pub fn submitted_with(&self, signature: &str) -> Option<&Approval> {
        self.submitted_approvals.iter().find(|a| {
            a.signature
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(signature))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionState::*;

    #[test]
    fn test_remote_mapping() {
        assert_eq!(TransactionState::from_remote("awaiting-approval"), Some(AwaitingApproval));
        assert_eq!(TransactionState::from_remote("pending"), Some(Submitted));
        assert_eq!(TransactionState::from_remote("success"), Some(Confirmed));
        assert_eq!(TransactionState::from_remote("failed"), Some(Failed));
        assert_eq!(TransactionState::from_remote("weird"), None);
    }

    #[test]
    fn test_forward_transitions() {
        assert!(Created.can_transition_to(AwaitingApproval));
        assert!(AwaitingApproval.can_transition_to(Submitted));
        assert!(AwaitingApproval.can_transition_to(Confirmed));
        assert!(Submitted.can_transition_to(Confirmed));
        assert!(Submitted.can_transition_to(Submitted));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for state in [Created, AwaitingApproval, Submitted] {
            assert!(state.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_no_backward_or_terminal_moves() {
        assert!(!Submitted.can_transition_to(AwaitingApproval));
        assert!(!AwaitingApproval.can_transition_to(Created));
        assert!(!Confirmed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Confirmed));
        assert!(!Failed.can_transition_to(Submitted));
    }

    #[test]
    fn test_snapshot_from_record() {
        let record: TransactionRecord = serde_json::from_value(serde_json::json!({
            "id": "tx-1",
            "status": "pending",
            "approvals": {
                "pending": [],
                "submitted": [{"signer": "evm-keypair:0xAbC", "signature": "0xAB01"}]
            },
            "onChain": {"userOperationHash": "0xaa"}
        }))
        .unwrap();

        let tx = Transaction::from_record("0xwallet", "base-sepolia", record);
        assert_eq!(tx.state, Some(Submitted));
        assert_eq!(tx.chain, "base-sepolia");
        assert!(!tx.is_settled());
        assert!(tx.submitted_by("evm-keypair:0xabc").is_some());
        assert!(tx.first_pending_signer().is_none());
        assert_eq!(
            tx.submitted_with("0xab01").map(|a| a.signer.as_str()),
            Some("evm-keypair:0xAbC")
        );
        assert!(tx.submitted_with("0xab02").is_none());
    }
}
