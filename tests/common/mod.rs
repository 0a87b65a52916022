//! Shared utilities for integration testing: an in-process mock of the
//! custodial wallet service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use alloy::hex;
use alloy::primitives::{Address, U256};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use wallet_orchestrator::config::{GatewayConfig, OrchestratorConfig, PollingConfig};
use wallet_orchestrator::TransactionOrchestrator;

pub const TEST_API_KEY: &str = "test-key";

// Anvil's first account
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_HASH: &str = "0x3f1c2b4e5d6a79880a1b2c3d4e5f60718293a4b5c6d7e8f90112233445566778";
pub const GOLDEN_SIGNATURE: &str = "0x48de96ef2d8dba3689667399742b6abbe56ad3cd1fe0827aae7f096aa06a0c547a17e1f47a834c437124184ecf5024b754a71da566e469b31beb90286c57169c1c";

/// Knobs controlling how the mock responds.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Status of a freshly created transaction.
    pub initial_status: String,
    /// Status reported once the transaction settles.
    pub settle_status: String,
    /// Number of polls after approval before the transaction settles.
    pub polls_before_settle: u32,
    pub faucet_rate_limited: bool,
    /// Whether transaction records carry the request `params`.
    pub echo_params: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            initial_status: "awaiting-approval".to_string(),
            settle_status: "success".to_string(),
            polls_before_settle: 2,
            faucet_rate_limited: false,
            echo_params: true,
        }
    }
}

#[derive(Debug, Clone)]
struct MockTransaction {
    id: String,
    wallet: String,
    chain: String,
    calls: Vec<Value>,
    status: String,
    pending: Vec<Value>,
    submitted: Vec<Value>,
    polls_since_approval: u32,
    applied: bool,
}

impl MockTransaction {
    fn to_json(&self, echo_params: bool) -> Value {
        let mut rendered = json!({
            "id": self.id,
            "status": self.status,
            "walletType": "evm-smart-wallet",
            "approvals": { "pending": self.pending, "submitted": self.submitted },
            "onChain": { "userOperationHash": TEST_HASH },
            "createdAt": "2024-01-01T00:00:00Z",
        });
        if echo_params {
            rendered["params"] = json!({ "calls": self.calls, "chain": self.chain });
        }
        rendered
    }
}

#[derive(Debug, Default)]
struct MockState {
    behavior: MockBehavior,
    requests: Vec<String>,
    admin_signers: HashMap<String, String>,
    transactions: HashMap<String, MockTransaction>,
    balances: HashMap<String, U256>,
    approvals_received: u32,
    last_signature: Option<String>,
}

type Shared = Arc<Mutex<MockState>>;

/// Handle to a running mock service.
#[derive(Clone)]
pub struct MockWalletService {
    pub addr: SocketAddr,
    state: Shared,
}

impl MockWalletService {
    pub async fn start(behavior: MockBehavior) -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            behavior,
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/api/2022-06-09/wallets", post(create_wallet))
            .route(
                "/api/2022-06-09/wallets/{wallet}/transactions",
                post(create_transaction),
            )
            .route(
                "/api/2022-06-09/wallets/{wallet}/transactions/{id}",
                get(get_transaction),
            )
            .route(
                "/api/2022-06-09/wallets/{wallet}/transactions/{id}/approvals",
                post(submit_approval),
            )
            .route("/api/v1-alpha2/wallets/{wallet}/balances", post(faucet))
            .route("/api/unstable/wallets/{locator}/tokens", get(tokens))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Configuration pointing at this mock with fast polling.
    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            gateway: GatewayConfig {
                base_url: self.base_url(),
                api_key: TEST_API_KEY.to_string(),
                request_timeout_secs: 5,
                connect_timeout_secs: 2,
                use_system_proxy: false,
            },
            polling: PollingConfig {
                settle_delay_ms: 5,
                base_delay_ms: 5,
                max_delay_ms: 20,
                max_attempts: 10,
                timeout_secs: 5,
            },
            ..OrchestratorConfig::default()
        }
    }

    pub fn orchestrator(&self) -> TransactionOrchestrator {
        TransactionOrchestrator::from_config(&self.config()).unwrap()
    }

    /// `METHOD path` of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn approvals_received(&self) -> u32 {
        self.state.lock().unwrap().approvals_received
    }

    pub fn last_signature(&self) -> Option<String> {
        self.state.lock().unwrap().last_signature.clone()
    }

    pub fn set_balance(&self, wallet: &str, base_units: u64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(wallet.to_lowercase(), U256::from(base_units));
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TEST_API_KEY)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized: invalid API key" })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{} not found", what) })),
    )
        .into_response()
}

async fn create_wallet(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push("POST /wallets".to_string());
    if !authorized(&headers) {
        return unauthorized();
    }

    let address = format!("0x{:040x}", 0xa11ce000u64 + state.admin_signers.len() as u64);
    let admin_signer = body["config"]["adminSigner"]["address"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.admin_signers.insert(address.clone(), admin_signer);

    Json(json!({
        "address": address,
        "type": body["type"],
        "config": body["config"],
        "createdAt": "2024-01-01T00:00:00Z",
    }))
    .into_response()
}

async fn create_transaction(
    State(state): State<Shared>,
    Path(wallet): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(format!("POST /wallets/{}/transactions", wallet));
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(admin_signer) = state.admin_signers.get(&wallet).cloned() else {
        return not_found("wallet");
    };

    let tx = MockTransaction {
        id: format!("tx-{}", state.transactions.len() + 1),
        wallet,
        chain: body["params"]["chain"].as_str().unwrap_or_default().to_string(),
        calls: body["params"]["calls"].as_array().cloned().unwrap_or_default(),
        status: state.behavior.initial_status.clone(),
        pending: vec![json!({
            "signer": format!("evm-keypair:{}", admin_signer),
            "message": TEST_HASH,
        })],
        submitted: Vec::new(),
        polls_since_approval: 0,
        applied: false,
    };
    let rendered = tx.to_json(state.behavior.echo_params);
    state.transactions.insert(tx.id.clone(), tx);
    Json(rendered).into_response()
}

async fn submit_approval(
    State(state): State<Shared>,
    Path((wallet, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state
        .requests
        .push(format!("POST /wallets/{}/transactions/{}/approvals", wallet, id));
    if !authorized(&headers) {
        return unauthorized();
    }

    let approval = body["approvals"][0].clone();
    let signature = approval["signature"].as_str().unwrap_or_default().to_string();
    state.approvals_received += 1;
    state.last_signature = Some(signature.clone());
    let echo_params = state.behavior.echo_params;

    let Some(tx) = state.transactions.get_mut(&id) else {
        return not_found("transaction");
    };
    tx.pending.clear();
    tx.submitted.push(json!({
        "signer": approval["signer"],
        "message": TEST_HASH,
        "signature": signature,
    }));
    tx.status = "pending".to_string();
    Json(tx.to_json(echo_params)).into_response()
}

async fn get_transaction(
    State(state): State<Shared>,
    Path((wallet, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut guard = state.lock().unwrap();
    let state = &mut *guard;
    state
        .requests
        .push(format!("GET /wallets/{}/transactions/{}", wallet, id));
    if !authorized(&headers) {
        return unauthorized();
    }

    let Some(tx) = state.transactions.get_mut(&id) else {
        return not_found("transaction");
    };
    if tx.status == "pending" {
        tx.polls_since_approval += 1;
        if tx.polls_since_approval >= state.behavior.polls_before_settle {
            tx.status = state.behavior.settle_status.clone();
        }
    }
    if tx.status == "success" && !tx.applied {
        tx.applied = true;
        for call in &tx.calls {
            if let Some((to, amount)) = decode_transfer(call) {
                let from = tx.wallet.to_lowercase();
                let sender = state.balances.entry(from).or_default();
                *sender = sender.saturating_sub(amount);
                *state.balances.entry(to).or_default() += amount;
            }
        }
    }
    Json(tx.to_json(state.behavior.echo_params)).into_response()
}

async fn faucet(
    State(state): State<Shared>,
    Path(wallet): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(format!("POST /wallets/{}/balances", wallet));
    if !authorized(&headers) {
        return unauthorized();
    }
    if state.behavior.faucet_rate_limited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": true, "message": "rate limited" })),
        )
            .into_response();
    }

    let whole = body["amount"].as_u64().unwrap_or_default();
    let credit = U256::from(whole) * U256::from(1_000_000u64);
    *state.balances.entry(wallet.to_lowercase()).or_default() += credit;
    let receipt = json!({ "txId": "faucet-tx", "amount": whole, "currency": body["currency"] });
    Json(receipt).into_response()
}

async fn tokens(
    State(state): State<Shared>,
    Path(locator): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(format!("GET /wallets/{}/tokens", locator));
    if !authorized(&headers) {
        return unauthorized();
    }

    let wallet = locator
        .split_once(':')
        .map(|(_, address)| address)
        .unwrap_or(&locator)
        .to_lowercase();
    let entries = match state.balances.get(&wallet) {
        Some(balance) => vec![json!({
            "tokenMetadata": { "symbol": "USDC", "decimals": 6 },
            "tokenBalance": format!("0x{:x}", balance),
        })],
        None => Vec::new(),
    };
    Json(Value::Array(entries)).into_response()
}

/// Recipient and amount of an ERC20 `transfer` call.
fn decode_transfer(call: &Value) -> Option<(String, U256)> {
    let data = hex::decode(call["data"].as_str()?.trim_start_matches("0x")).ok()?;
    if data.len() != 68 || data[..4] != [0xa9, 0x05, 0x9c, 0xbb] {
        return None;
    }
    let to = Address::from_slice(&data[16..36]);
    let amount = U256::from_be_slice(&data[36..68]);
    Some((format!("0x{}", hex::encode(to.as_slice())), amount))
}
