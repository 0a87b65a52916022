//! Wire types exchanged with the wallet service.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Wallet flavours the service can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletKind {
    EvmSmartWallet,
    SolanaCustodialWallet,
}

impl WalletKind {
    pub const ALL: [WalletKind; 2] = [
        WalletKind::EvmSmartWallet,
        WalletKind::SolanaCustodialWallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::EvmSmartWallet => "evm-smart-wallet",
            WalletKind::SolanaCustodialWallet => "solana-custodial-wallet",
        }
    }

    /// Signer type the service expects for this wallet's admin.
    pub fn admin_signer_type(&self) -> &'static str {
        match self {
            WalletKind::EvmSmartWallet => "evm-keypair",
            WalletKind::SolanaCustodialWallet => "solana-keypair",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                OrchestratorError::Validation(format!(
                    "Invalid wallet type '{}'. Must be one of: {}",
                    s,
                    WalletKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

/// `{type, address}` of a wallet's admin signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSigner {
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_signer: Option<AdminSigner>,
}

/// `POST /wallets` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWalletRequest {
    #[serde(rename = "type")]
    pub kind: WalletKind,
    pub config: WalletConfig,
}

impl CreateWalletRequest {
    pub fn new(kind: WalletKind, admin_signer: &str) -> Self {
        Self {
            kind,
            config: WalletConfig {
                admin_signer: Some(AdminSigner {
                    kind: kind.admin_signer_type().to_string(),
                    address: admin_signer.to_string(),
                }),
            },
        }
    }
}

/// A wallet as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub address: String,
    #[serde(rename = "type")]
    pub kind: WalletKind,
    #[serde(default)]
    pub config: WalletConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One on-chain call. `value` is a decimal string, `data` is `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: String,
    pub value: String,
    pub data: String,
}

impl Call {
    pub fn new(to: Address, value: U256, data: Bytes) -> Self {
        Self {
            to: to.to_string(),
            value: value.to_string(),
            data: data.to_string(),
        }
    }

    /// Contract call that moves no native value.
    pub fn contract_call(to: Address, data: Bytes) -> Self {
        Self::new(to, U256::ZERO, data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    pub calls: Vec<Call>,
    pub chain: String,
}

/// `POST /wallets/{address}/transactions` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransactionRequest {
    pub params: TransactionParams,
}

/// A pending or submitted approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub signer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approvals {
    #[serde(default)]
    pub pending: Vec<Approval>,
    #[serde(default)]
    pub submitted: Vec<Approval>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_operation_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_link: Option<String>,
}

/// A transaction as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_type: Option<String>,
    #[serde(default)]
    pub approvals: Approvals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<TransactionParams>,
    #[serde(default)]
    pub on_chain: OnChain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalSubmission {
    pub signer: String,
    pub signature: String,
}

/// `POST .../approvals` body.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitApprovalRequest {
    pub approvals: Vec<ApprovalSubmission>,
}

/// `POST /wallets/{address}/balances` body (faucet).
#[derive(Debug, Clone, Serialize)]
pub struct FaucetRequest {
    pub amount: u64,
    pub chain: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub symbol: Option<String>,
}

/// One entry of `GET /wallets/{chain}:{address}/tokens`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceRecord {
    #[serde(default)]
    pub token_metadata: TokenMetadata,
    #[serde(default)]
    pub token_balance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wallet_kind_parse() {
        assert_eq!(
            "evm-smart-wallet".parse::<WalletKind>().unwrap(),
            WalletKind::EvmSmartWallet
        );
        let err = "evm-eoa".parse::<WalletKind>().unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("solana-custodial-wallet"));
    }

    #[test]
    fn test_create_wallet_body() {
        let body = serde_json::to_value(CreateWalletRequest::new(
            WalletKind::EvmSmartWallet,
            "0xABC",
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "type": "evm-smart-wallet",
                "config": {"adminSigner": {"type": "evm-keypair", "address": "0xABC"}}
            })
        );
    }

    #[test]
    fn test_transaction_record_decode() {
        let record: TransactionRecord = serde_json::from_value(json!({
            "id": "tx-1",
            "walletType": "evm-smart-wallet",
            "status": "awaiting-approval",
            "approvals": {
                "pending": [{"signer": "evm-keypair:0xabc", "message": "0x01"}],
                "submitted": []
            },
            "params": {
                "calls": [{"to": "0x1", "value": "0", "data": "0x"}],
                "chain": "base-sepolia"
            },
            "onChain": {"userOperationHash": "0xdeadbeef"},
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.status, "awaiting-approval");
        assert_eq!(record.approvals.pending[0].signer, "evm-keypair:0xabc");
        assert_eq!(record.on_chain.user_operation_hash.as_deref(), Some("0xdeadbeef"));
        assert_eq!(record.params.unwrap().chain, "base-sepolia");
    }

    #[test]
    fn test_sparse_transaction_record() {
        let record: TransactionRecord =
            serde_json::from_value(json!({"id": "tx-2", "status": "pending"})).unwrap();
        assert!(record.approvals.pending.is_empty());
        assert!(record.on_chain.user_operation_hash.is_none());
    }

    #[test]
    fn test_call_encoding() {
        let to: Address = "0x14196F08a4Fa0B66B7331bC40dd6bCd8A1dEeA9F".parse().unwrap();
        let call = Call::contract_call(to, Bytes::from(vec![0xa9, 0x05]));
        assert_eq!(call.value, "0");
        assert_eq!(call.data, "0xa905");
        assert_eq!(call.to, "0x14196F08a4Fa0B66B7331bC40dd6bCd8A1dEeA9F");
    }
}
