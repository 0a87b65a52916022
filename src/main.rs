//! walletctl: command-line front end for smart wallet orchestration.
//!
//! Every command prints one JSON envelope on stdout:
//!
//! ```text
//! {"status": "success", "timestamp": "...", ...payload}
//! {"status": "error",   "timestamp": "...", "kind": "...", "error": "..."}
//! ```
//!
//! Logs go to stderr. Secrets are read from the environment (or `.env`):
//! `CROSSMINT_SERVER_API_KEY` for the wallet service and `SIGNER_PRIVATE_KEY`
//! for the admin signer.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use wallet_orchestrator::blockchain::explorer;
use wallet_orchestrator::blockchain::signing::{OperationSignature, SignerKey};
use wallet_orchestrator::blockchain::units::TokenAmount;
use wallet_orchestrator::config::{load_or_default, OrchestratorConfig};
use wallet_orchestrator::gateway::types::WalletKind;
use wallet_orchestrator::observability::{logging, metrics};
use wallet_orchestrator::orchestrator::{
    run_automated_flow, FlowParams, TransferOutcome, TransferRequest,
};
use wallet_orchestrator::resilience::CancelToken;
use wallet_orchestrator::{
    Envelope, OrchestratorError, OrchestratorResult, TransactionOrchestrator, WalletRegistry,
};

#[derive(Parser)]
#[command(name = "walletctl")]
#[command(
    about = "Create smart wallets and move tokens through a custodial wallet service",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "WALLETCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Chain identifier, overriding the configured default
    #[arg(long)]
    chain: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh admin signer key pair
    Keygen,
    /// Create a wallet administered by the signer
    CreateWallet {
        #[arg(long, default_value = "evm-smart-wallet")]
        kind: String,
        /// Admin signer address; defaults to the configured or derived signer
        #[arg(long)]
        signer: Option<String>,
    },
    /// Request test tokens for a wallet
    Faucet {
        #[arg(long)]
        wallet: String,
        /// Whole tokens
        #[arg(long, default_value_t = 10)]
        amount: u64,
    },
    /// Show a wallet's balance of the configured asset
    Balance {
        #[arg(long)]
        wallet: String,
    },
    /// Create an unsigned transfer transaction
    CreateTx {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        to: String,
        /// Display units, e.g. 1.5
        #[arg(long)]
        amount: String,
    },
    /// Sign a user operation hash with SIGNER_PRIVATE_KEY
    Sign {
        #[arg(long)]
        hash: String,
    },
    /// Submit an approval signature for a pending transaction
    Approve {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        tx: String,
        #[arg(long)]
        signature: String,
        /// Signer locator; defaults to the first pending signer
        #[arg(long)]
        signer: Option<String>,
    },
    /// Show a transaction
    GetTx {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        tx: String,
        /// Wait this long before the single poll
        #[arg(long)]
        wait_ms: Option<u64>,
        /// Poll until the transaction settles
        #[arg(long)]
        follow: bool,
    },
    /// Create, sign and submit a transfer
    Transfer {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        to: String,
        /// Display units, e.g. 1.5
        #[arg(long)]
        amount: String,
        /// Poll until the transaction settles
        #[arg(long)]
        wait: bool,
    },
    /// Run the full create/fund/transfer/settle flow
    Automate {
        /// Whole tokens requested from the faucet
        #[arg(long, default_value_t = 100)]
        fund: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing("info");
            let err = OrchestratorError::Validation(e.to_string());
            return emit(Envelope::<Value>::failure(&err));
        }
    };

    logging::init_tracing(&config.observability.log_level);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let chain = cli
        .chain
        .clone()
        .unwrap_or_else(|| config.asset.default_chain.clone());

    emit(Envelope::from_result(
        run(cli.command, &config, &chain, &cancel).await,
    ))
}

async fn run(
    command: Commands,
    config: &OrchestratorConfig,
    chain: &str,
    cancel: &CancelToken,
) -> OrchestratorResult<Value> {
    match command {
        Commands::Keygen => {
            let key = SignerKey::random();
            tracing::info!(address = %key.address(), "Generated signer key");
            Ok(json!({
                "address": key.address().to_string(),
                "private_key": key.private_key_hex(),
            }))
        }
        Commands::Sign { hash } => {
            let key = SignerKey::from_env()?;
            let signature = key.sign(&hash)?;
            Ok(json!({
                "signer": key.address().to_string(),
                "user_operation_hash": hash,
                "signature": signature.to_hex(),
            }))
        }
        Commands::CreateWallet { kind, signer } => {
            let kind: WalletKind = kind.parse()?;
            let signer = match signer {
                Some(address) => address,
                None => signer_address(config)?,
            };
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let registry = WalletRegistry::new();
            let wallet = orchestrator.create_wallet(&registry, kind, &signer).await?;
            let mut payload = to_payload(&wallet)?;
            if let Some(url) = explorer::address_url(chain, &wallet.address) {
                payload["explorer_link"] = Value::String(url);
            }
            Ok(payload)
        }
        Commands::Faucet { wallet, amount } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let receipt = orchestrator
                .gateway()
                .get_faucet_funds(chain, &wallet, amount)
                .await?;
            Ok(json!({ "wallet": wallet, "chain": chain, "amount": amount, "receipt": receipt }))
        }
        Commands::Balance { wallet } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let balance = orchestrator.gateway().get_token_balance(chain, &wallet).await?;
            Ok(json!({
                "wallet": wallet,
                "chain": chain,
                "symbol": orchestrator.asset().symbol,
                "balance": balance,
            }))
        }
        Commands::CreateTx { wallet, to, amount } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let amount = TokenAmount::parse_display(&amount, orchestrator.asset().decimals)?;
            let call = orchestrator.build_transfer_call(parse_address(&to)?, &amount)?;
            let tx = orchestrator.create_transaction(&wallet, chain, &[call]).await?;
            to_payload(&tx)
        }
        Commands::Approve {
            wallet,
            tx,
            signature,
            signer,
        } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let signature = OperationSignature::from_hex(&signature)?;
            let updated = orchestrator
                .submit_approval(&wallet, chain, &tx, signer.as_deref(), &signature)
                .await?;
            to_payload(&updated)
        }
        Commands::GetTx {
            wallet,
            tx,
            wait_ms,
            follow,
        } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let current = match wait_ms {
                Some(ms) => {
                    orchestrator
                        .poll_once_after(&wallet, chain, &tx, Duration::from_millis(ms))
                        .await?
                }
                None => orchestrator.get_transaction(&wallet, chain, &tx).await?,
            };
            if follow {
                to_payload(&orchestrator.await_settlement(&current, cancel).await?)
            } else {
                to_payload(&current)
            }
        }
        Commands::Transfer {
            wallet,
            to,
            amount,
            wait,
        } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let amount = TokenAmount::parse_display(&amount, orchestrator.asset().decimals)?;
            let outcome = orchestrator
                .transfer(TransferRequest {
                    from_wallet: wallet,
                    to: parse_address(&to)?,
                    amount,
                    chain: chain.to_string(),
                    signer: SignerKey::from_env_optional()?,
                })
                .await?;
            match outcome {
                TransferOutcome::Submitted(tx) if wait => {
                    to_payload(&orchestrator.await_settlement(&tx, cancel).await?)
                }
                other => to_payload(&other),
            }
        }
        Commands::Automate { fund } => {
            let orchestrator = TransactionOrchestrator::from_config(config)?;
            let registry = WalletRegistry::new();
            let signer = SignerKey::from_env()?;
            let params = FlowParams {
                chain: chain.to_string(),
                fund_whole_tokens: fund,
            };
            let report =
                run_automated_flow(&orchestrator, &registry, &signer, &params, cancel).await?;
            to_payload(&report)
        }
    }
}

/// Admin signer address: configured value first, otherwise derived from the key.
fn signer_address(config: &OrchestratorConfig) -> OrchestratorResult<String> {
    if !config.signer.address.trim().is_empty() {
        return Ok(config.signer.address.clone());
    }
    Ok(SignerKey::from_env()?.address().to_string())
}

fn parse_address(value: &str) -> OrchestratorResult<Address> {
    value
        .parse()
        .map_err(|e| OrchestratorError::Validation(format!("invalid address '{}': {}", value, e)))
}

fn to_payload<T: Serialize>(value: &T) -> OrchestratorResult<Value> {
    serde_json::to_value(value).map_err(|e| OrchestratorError::MalformedResponse(e.to_string()))
}

fn emit(envelope: Envelope<Value>) -> ExitCode {
    let code = if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };
    match serde_json::to_string_pretty(&envelope) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => eprintln!("Failed to render result: {}", e),
    }
    code
}
