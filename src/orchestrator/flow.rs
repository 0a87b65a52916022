//! End-to-end demonstration flow.
//!
//! Two fresh smart wallets, faucet funding for the first, a transfer of half
//! the funds to the second, then settlement and final balances.

use std::collections::BTreeMap;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::blockchain::explorer;
use crate::blockchain::signing::SignerKey;
use crate::blockchain::units::TokenAmount;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::gateway::types::WalletKind;
use crate::orchestrator::state::Transaction;
use crate::orchestrator::transfer::{TransactionOrchestrator, TransferOutcome, TransferRequest};
use crate::registry::WalletRegistry;
use crate::resilience::{poll_until, CancelToken, PollPolicy, PollStatus};

/// Parameters of the automated flow.
#[derive(Debug, Clone)]
pub struct FlowParams {
    pub chain: String,
    /// Faucet request in whole tokens.
    pub fund_whole_tokens: u64,
}

/// Summary of a completed flow.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub wallet1_address: String,
    pub wallet2_address: String,
    pub transaction_id: String,
    pub transferred: TokenAmount,
    pub final_transaction: Transaction,
    pub wallet1_final_balance: TokenAmount,
    pub wallet2_final_balance: TokenAmount,
    pub explorer_links: BTreeMap<String, String>,
}

/// Run the flow. Stops at the first failing step.
pub async fn run_automated_flow(
    orchestrator: &TransactionOrchestrator,
    registry: &WalletRegistry,
    signer: &SignerKey,
    params: &FlowParams,
    cancel: &CancelToken,
) -> OrchestratorResult<FlowReport> {
    let signer_address = signer.address().to_string();
    let gateway = orchestrator.gateway();
    let decimals = orchestrator.asset().decimals;

    tracing::info!(step = 1, "Creating first EVM smart wallet");
    let wallet1 = orchestrator
        .create_wallet(registry, WalletKind::EvmSmartWallet, &signer_address)
        .await?;

    tracing::info!(step = 2, "Creating second EVM smart wallet");
    let wallet2 = orchestrator
        .create_wallet(registry, WalletKind::EvmSmartWallet, &signer_address)
        .await?;

    tracing::info!(
        step = 3,
        amount = params.fund_whole_tokens,
        wallet = %wallet1.address,
        "Requesting faucet funds"
    );
    gateway
        .get_faucet_funds(&params.chain, &wallet1.address, params.fund_whole_tokens)
        .await?;

    let policy = PollPolicy::from_config(orchestrator.polling());
    let funded_address = wallet1.address.as_str();
    let funded = poll_until(&policy, cancel, "faucet funding", |_| async move {
        let balance = gateway.get_token_balance(&params.chain, funded_address).await?;
        if balance.is_zero() {
            Ok(PollStatus::Pending)
        } else {
            Ok(PollStatus::Ready(balance))
        }
    })
    .await?;
    tracing::info!(balance = %funded, "First wallet funded");

    let requested = TokenAmount::parse_display(&params.fund_whole_tokens.to_string(), decimals)?;
    let half = TokenAmount::from_base_units(requested.base_units() / U256::from(2u64), decimals);

    let destination: Address = wallet2.address.parse().map_err(|e| {
        OrchestratorError::MalformedResponse(format!(
            "wallet address '{}' is not an EVM address: {}",
            wallet2.address, e
        ))
    })?;

    tracing::info!(step = 4, amount = %half, "Transferring to second wallet");
    let outcome = orchestrator
        .transfer(TransferRequest {
            from_wallet: wallet1.address.clone(),
            to: destination,
            amount: half,
            chain: params.chain.clone(),
            signer: Some(signer.clone()),
        })
        .await?;
    let submitted = match outcome {
        TransferOutcome::Submitted(tx) => tx,
        TransferOutcome::AwaitingSignature(tx) => {
            return Err(OrchestratorError::UnexpectedState(format!(
                "transaction {} was not signed",
                tx.id
            )))
        }
    };

    tracing::info!(step = 5, transaction_id = %submitted.id, "Waiting for settlement");
    let final_transaction = orchestrator.await_settlement(&submitted, cancel).await?;

    let wallet1_final_balance = gateway.get_token_balance(&params.chain, &wallet1.address).await?;
    let wallet2_final_balance = gateway.get_token_balance(&params.chain, &wallet2.address).await?;

    let mut explorer_links = BTreeMap::new();
    for (label, address) in [("wallet1", &wallet1.address), ("wallet2", &wallet2.address)] {
        if let Some(url) = explorer::address_url(&params.chain, address) {
            explorer_links.insert(label.to_string(), url);
        }
    }

    Ok(FlowReport {
        wallet1_address: wallet1.address,
        wallet2_address: wallet2.address,
        transaction_id: final_transaction.id.clone(),
        transferred: half,
        final_transaction,
        wallet1_final_balance,
        wallet2_final_balance,
        explorer_links,
    })
}
