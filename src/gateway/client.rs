//! HTTP client for the custodial wallet service.
//!
//! # Responsibilities
//! - Build versioned endpoint URLs and attach the API key
//! - Enforce connect/request timeouts
//! - Normalize every non-success response into an `OrchestratorError`
//! - Decode token balances for the tracked asset

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::blockchain::units::{decode_balance, TokenAmount};
use crate::config::{AssetConfig, GatewayConfig};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::gateway::types::{
    ApprovalSubmission, Call, CreateTransactionRequest, CreateWalletRequest, FaucetRequest,
    SubmitApprovalRequest, TokenBalanceRecord, TransactionParams, TransactionRecord, WalletKind,
    WalletRecord,
};
use crate::observability::metrics;

/// API version serving wallet and transaction resources.
pub const WALLETS_API_VERSION: &str = "2022-06-09";
/// API version serving the staging faucet.
pub const FAUCET_API_VERSION: &str = "v1-alpha2";
/// API version serving token balances.
pub const TOKENS_API_VERSION: &str = "unstable";

const API_KEY_HEADER: &str = "x-api-key";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stateless gateway to the wallet service.
#[derive(Clone)]
pub struct WalletGateway {
    http: Client,
    base_url: String,
    api_key: String,
    asset: AssetConfig,
}

impl WalletGateway {
    /// Create a gateway. Fails if the API key is missing or the base URL is
    /// unusable.
    pub fn new(config: &GatewayConfig, asset: AssetConfig) -> OrchestratorResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "wallet service API key is not configured".to_string(),
            ));
        }
        Url::parse(&config.base_url).map_err(|e| {
            OrchestratorError::Validation(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(|e| {
            OrchestratorError::Transport(format!("failed to build HTTP client: {}", e))
        })?;

        tracing::debug!(base_url = %config.base_url, "Wallet gateway initialized");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            asset,
        })
    }

    pub fn asset(&self) -> &AssetConfig {
        &self.asset
    }

    /// Create a wallet administered by `admin_signer`.
    pub async fn create_wallet(
        &self,
        kind: WalletKind,
        admin_signer: &str,
    ) -> OrchestratorResult<WalletRecord> {
        require("admin signer address", admin_signer)?;

        let url = self.endpoint(WALLETS_API_VERSION, &["wallets"])?;
        let body = CreateWalletRequest::new(kind, admin_signer);
        let wallet: WalletRecord = self
            .send("create_wallet", self.http.post(url).json(&body))
            .await?;

        tracing::info!(address = %wallet.address, kind = %wallet.kind, "Wallet created");
        Ok(wallet)
    }

    /// Ask the service to build an unsigned transaction for `calls`.
    ///
    /// An empty call list is rejected; nothing is sent.
    pub async fn create_transaction(
        &self,
        wallet_address: &str,
        chain: &str,
        calls: &[Call],
    ) -> OrchestratorResult<TransactionRecord> {
        require("wallet address", wallet_address)?;
        require("chain", chain)?;
        if calls.is_empty() {
            return Err(OrchestratorError::Validation(
                "at least one call is required to create a transaction".to_string(),
            ));
        }

        let url = self.endpoint(WALLETS_API_VERSION, &["wallets", wallet_address, "transactions"])?;
        let body = CreateTransactionRequest {
            params: TransactionParams {
                calls: calls.to_vec(),
                chain: chain.to_string(),
            },
        };
        let record: TransactionRecord = self
            .send("create_transaction", self.http.post(url).json(&body))
            .await?;

        tracing::info!(
            wallet = wallet_address,
            transaction_id = %record.id,
            status = %record.status,
            "Transaction created"
        );
        Ok(record)
    }

    /// Submit a signature for a pending approval.
    pub async fn submit_approval(
        &self,
        wallet_address: &str,
        transaction_id: &str,
        signer_id: &str,
        signature: &str,
    ) -> OrchestratorResult<TransactionRecord> {
        require("wallet address", wallet_address)?;
        require("transaction id", transaction_id)?;
        require("signer id", signer_id)?;
        require("signature", signature)?;

        let url = self.endpoint(
            WALLETS_API_VERSION,
            &["wallets", wallet_address, "transactions", transaction_id, "approvals"],
        )?;
        let body = SubmitApprovalRequest {
            approvals: vec![ApprovalSubmission {
                signer: signer_id.to_string(),
                signature: signature.to_string(),
            }],
        };
        let record: TransactionRecord = self
            .send("submit_approval", self.http.post(url).json(&body))
            .await?;

        tracing::info!(
            wallet = wallet_address,
            transaction_id,
            status = %record.status,
            "Approval submitted"
        );
        Ok(record)
    }

    /// Fetch the current view of a transaction.
    pub async fn get_transaction(
        &self,
        wallet_address: &str,
        transaction_id: &str,
    ) -> OrchestratorResult<TransactionRecord> {
        require("wallet address", wallet_address)?;
        require("transaction id", transaction_id)?;

        let url = self.endpoint(
            WALLETS_API_VERSION,
            &["wallets", wallet_address, "transactions", transaction_id],
        )?;
        self.send("get_transaction", self.http.get(url)).await
    }

    /// Request test funds. `whole_tokens` is in display units.
    pub async fn get_faucet_funds(
        &self,
        chain: &str,
        wallet_address: &str,
        whole_tokens: u64,
    ) -> OrchestratorResult<Value> {
        require("chain", chain)?;
        require("wallet address", wallet_address)?;
        if whole_tokens == 0 {
            return Err(OrchestratorError::Validation(
                "faucet amount must be greater than zero".to_string(),
            ));
        }

        let url = self.endpoint(FAUCET_API_VERSION, &["wallets", wallet_address, "balances"])?;
        let body = FaucetRequest {
            amount: whole_tokens,
            chain: chain.to_string(),
            currency: self.asset.faucet_currency.clone(),
        };
        let receipt: Value = self
            .send("get_faucet_funds", self.http.post(url).json(&body))
            .await?;

        tracing::info!(
            wallet = wallet_address,
            chain,
            amount = whole_tokens,
            "Faucet funds requested"
        );
        Ok(receipt)
    }

    /// Balance of the tracked asset. A wallet without an entry holds zero.
    pub async fn get_token_balance(
        &self,
        chain: &str,
        wallet_address: &str,
    ) -> OrchestratorResult<TokenAmount> {
        require("chain", chain)?;
        require("wallet address", wallet_address)?;

        let locator = format!("{}:{}", chain, wallet_address);
        let url = self.endpoint(TOKENS_API_VERSION, &["wallets", &locator, "tokens"])?;
        let tokens: Vec<TokenBalanceRecord> =
            self.send("get_token_balance", self.http.get(url)).await?;

        select_balance(&tokens, &self.asset.symbol, self.asset.decimals)
    }

    fn endpoint(&self, version: &str, segments: &[&str]) -> OrchestratorResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, version))
            .map_err(|e| OrchestratorError::Validation(format!("invalid endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| OrchestratorError::Validation("base URL cannot carry a path".to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> OrchestratorResult<T> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let result = self.execute(request, request_id).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_gateway_request(operation, outcome, started.elapsed());

        match &result {
            Ok(_) => tracing::debug!(
                operation,
                request_id = %request_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Wallet service call succeeded"
            ),
            Err(e) => tracing::warn!(
                operation,
                request_id = %request_id,
                error = %e,
                "Wallet service call failed"
            ),
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        request_id: Uuid,
    ) -> OrchestratorResult<T> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(normalize_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| OrchestratorError::MalformedResponse(e.to_string()))
    }
}

impl std::fmt::Debug for WalletGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletGateway")
            .field("base_url", &self.base_url)
            .field("asset", &self.asset.symbol)
            .finish_non_exhaustive()
    }
}

fn require(what: &str, value: &str) -> OrchestratorResult<()> {
    if value.trim().is_empty() {
        return Err(OrchestratorError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

/// Map a non-success response to an error.
///
/// The JSON `message` field is preferred; otherwise the raw body is used.
/// HTTP 429 keeps the remote message unwrapped.
pub fn normalize_error(status: StatusCode, body: &str) -> OrchestratorError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

    if status == StatusCode::TOO_MANY_REQUESTS {
        if let Some(message) = message {
            return OrchestratorError::RateLimited(message);
        }
    }

    let message = match message {
        Some(m) => m,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        None => body.to_string(),
    };

    OrchestratorError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Pick the entry for `symbol` and decode it. Absence means zero.
pub fn select_balance(
    tokens: &[TokenBalanceRecord],
    symbol: &str,
    decimals: u8,
) -> OrchestratorResult<TokenAmount> {
    let entry = tokens
        .iter()
        .find(|t| t.token_metadata.symbol.as_deref() == Some(symbol));

    match entry.and_then(|t| t.token_balance.as_deref()) {
        Some(hex_balance) => decode_balance(hex_balance, decimals),
        None => Ok(TokenAmount::zero(decimals)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway_config() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://wallets.example.com/api/".to_string(),
            api_key: "sk_test".to_string(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let mut config = gateway_config();
        config.api_key = String::new();
        let err = WalletGateway::new(&config, AssetConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_endpoint_building() {
        let gateway = WalletGateway::new(&gateway_config(), AssetConfig::default()).unwrap();
        let url = gateway
            .endpoint(WALLETS_API_VERSION, &["wallets", "0xabc", "transactions", "tx-1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://wallets.example.com/api/2022-06-09/wallets/0xabc/transactions/tx-1"
        );

        let url = gateway
            .endpoint(TOKENS_API_VERSION, &["wallets", "base-sepolia:0xabc", "tokens"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://wallets.example.com/api/unstable/wallets/base-sepolia:0xabc/tokens"
        );
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let gateway = WalletGateway::new(&gateway_config(), AssetConfig::default()).unwrap();
        let url = gateway
            .endpoint(WALLETS_API_VERSION, &["wallets", "../admin", "transactions"])
            .unwrap();
        assert!(!url.path().contains("/../"));
    }

    #[test]
    fn test_normalize_json_message() {
        let err = normalize_error(StatusCode::BAD_REQUEST, r#"{"message":"bad chain"}"#);
        match err {
            OrchestratorError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad chain");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_normalize_raw_text() {
        let err = normalize_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(err.to_string(), "API Error: upstream exploded");

        let err = normalize_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "API Error: Not Found");
    }

    #[test]
    fn test_normalize_rate_limit() {
        let err = normalize_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":true,"message":"rate limited"}"#,
        );
        assert!(matches!(err, OrchestratorError::RateLimited(_)));
        assert_eq!(err.to_string(), "rate limited");

        // 429 without a message still reports something useful
        let err = normalize_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.to_string(), "API Error: slow down");
    }

    #[test]
    fn test_select_balance() {
        let tokens: Vec<TokenBalanceRecord> = serde_json::from_value(json!([
            {"tokenMetadata": {"symbol": "ETH"}, "tokenBalance": "0xde0b6b3a7640000"},
            {"tokenMetadata": {"symbol": "USDC"}, "tokenBalance": "0x2faf080"}
        ]))
        .unwrap();

        let balance = select_balance(&tokens, "USDC", 6).unwrap();
        assert_eq!(balance.to_string(), "50");

        let missing = select_balance(&tokens, "DAI", 6).unwrap();
        assert!(missing.is_zero());
    }
}
