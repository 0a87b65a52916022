//! Transaction orchestrator.
//!
//! # Responsibilities
//! - Create wallets and record them in the caller's registry
//! - Create transactions and check they wait for approval
//! - Sign user operation hashes and submit approvals exactly once
//! - Track transactions to a terminal state with bounded, cancellable polling
//! - Compose the above into an ERC20 transfer

use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::Address;
use serde::Serialize;

use crate::blockchain::abi::encode_transfer;
use crate::blockchain::signing::{OperationSignature, SignerKey};
use crate::blockchain::units::TokenAmount;
use crate::config::{AssetConfig, OrchestratorConfig, PollingConfig};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::gateway::types::{Call, WalletKind};
use crate::gateway::WalletGateway;
use crate::observability::metrics;
use crate::orchestrator::state::{Transaction, TransactionState};
use crate::registry::{Wallet, WalletRegistry};
use crate::resilience::{poll_until, CancelToken, PollPolicy, PollStatus};

/// Remote status a freshly created transaction must report.
pub const AWAITING_APPROVAL_STATUS: &str = "awaiting-approval";

/// Inputs for [`TransactionOrchestrator::transfer`].
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_wallet: String,
    pub to: Address,
    /// Base units; no scaling happens past this point.
    pub amount: TokenAmount,
    pub chain: String,
    /// Without a key the transfer stops once the transaction is created.
    pub signer: Option<SignerKey>,
}

/// How far a transfer got.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "transaction", rename_all = "snake_case")]
pub enum TransferOutcome {
    /// Created; the caller must sign out-of-band.
    AwaitingSignature(Transaction),
    /// Approval accepted by the service.
    Submitted(Transaction),
}

impl TransferOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            TransferOutcome::AwaitingSignature(tx) | TransferOutcome::Submitted(tx) => tx,
        }
    }
}

/// Drives transactions through their lifecycle. Holds no transaction state
/// between calls; every call re-reads from the gateway.
#[derive(Debug, Clone)]
pub struct TransactionOrchestrator {
    gateway: WalletGateway,
    polling: PollingConfig,
}

impl TransactionOrchestrator {
    pub fn new(gateway: WalletGateway, polling: PollingConfig) -> Self {
        Self { gateway, polling }
    }

    /// Build the gateway and orchestrator from a validated configuration.
    pub fn from_config(config: &OrchestratorConfig) -> OrchestratorResult<Self> {
        let gateway = WalletGateway::new(&config.gateway, config.asset.clone())?;
        Ok(Self::new(gateway, config.polling.clone()))
    }

    pub fn gateway(&self) -> &WalletGateway {
        &self.gateway
    }

    pub fn asset(&self) -> &AssetConfig {
        self.gateway.asset()
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    /// Create a wallet and append it to `registry`.
    pub async fn create_wallet(
        &self,
        registry: &WalletRegistry,
        kind: WalletKind,
        admin_signer: &str,
    ) -> OrchestratorResult<Wallet> {
        let record = self.gateway.create_wallet(kind, admin_signer).await?;
        let wallet = Wallet::from_record(&record, admin_signer);
        registry.register(wallet.clone());
        Ok(wallet)
    }

    /// ERC20 `transfer` of `amount` base units of the tracked asset to `to`.
    pub fn build_transfer_call(
        &self,
        to: Address,
        amount: &TokenAmount,
    ) -> OrchestratorResult<Call> {
        let contract: Address = self.asset().contract_address.parse().map_err(|e| {
            OrchestratorError::Validation(format!(
                "invalid token contract '{}': {}",
                self.asset().contract_address,
                e
            ))
        })?;
        Ok(Call::contract_call(contract, encode_transfer(to, amount.base_units())))
    }

    /// Create a transaction and check that it is waiting for approval.
    ///
    /// Any other initial status is a failure carrying the raw status.
    pub async fn create_transaction(
        &self,
        wallet_address: &str,
        chain: &str,
        calls: &[Call],
    ) -> OrchestratorResult<Transaction> {
        let record = self
            .gateway
            .create_transaction(wallet_address, chain, calls)
            .await?;

        if record.status != AWAITING_APPROVAL_STATUS {
            metrics::record_transaction("unexpected_status");
            tracing::warn!(
                transaction_id = %record.id,
                status = %record.status,
                "Transaction not awaiting approval"
            );
            return Err(OrchestratorError::UnexpectedStatus {
                transaction_id: record.id,
                status: record.status,
            });
        }

        let tx = Transaction::from_record(wallet_address, chain, record);
        tracing::info!(
            transaction_id = %tx.id,
            state = %TransactionState::AwaitingApproval,
            "Transaction awaiting approval"
        );
        Ok(tx)
    }

    /// Sign the transaction's user operation hash.
    pub fn sign(
        &self,
        key: &SignerKey,
        tx: &Transaction,
    ) -> OrchestratorResult<OperationSignature> {
        let hash = tx.user_operation_hash.as_deref().ok_or_else(|| {
            OrchestratorError::UnexpectedState(format!(
                "transaction {} has no user operation hash",
                tx.id
            ))
        })?;

        match key.sign(hash) {
            Ok(signature) => {
                metrics::record_signature("success");
                tracing::debug!(
                    transaction_id = %tx.id,
                    signer = %key.address(),
                    signature = %signature.short(),
                    "User operation signed"
                );
                Ok(signature)
            }
            Err(e) => {
                metrics::record_signature("failure");
                Err(e.into())
            }
        }
    }

    /// Submit `signature` against a snapshot that is awaiting approval.
    ///
    /// With no `signer_id` the first pending signer is used, or, once nothing
    /// is pending, the signer that already submitted `signature`. If the same
    /// signer already submitted the same signature this is a no-op returning
    /// the snapshot; a different signature from that signer is a `Conflict`.
    pub async fn approve(
        &self,
        tx: &Transaction,
        signer_id: Option<&str>,
        signature: &OperationSignature,
    ) -> OrchestratorResult<Transaction> {
        let signature_hex = signature.to_hex();
        let signer_id = match signer_id {
            Some(id) => id.to_string(),
            None => tx
                .first_pending_signer()
                .or_else(|| tx.submitted_with(&signature_hex).map(|a| a.signer.as_str()))
                .map(str::to_string)
                .ok_or_else(|| {
                    OrchestratorError::UnexpectedState(format!(
                        "transaction {} has no pending approvals",
                        tx.id
                    ))
                })?,
        };

        if let Some(existing) = tx.submitted_by(&signer_id) {
            let same = existing
                .signature
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(&signature_hex));
            if same {
                tracing::info!(
                    transaction_id = %tx.id,
                    signer = %signer_id,
                    "Approval already submitted, skipping"
                );
                return Ok(tx.clone());
            }
            return Err(OrchestratorError::Conflict(format!(
                "signer {} already approved transaction {} with a different signature",
                signer_id, tx.id
            )));
        }

        if tx.state != Some(TransactionState::AwaitingApproval) {
            return Err(OrchestratorError::UnexpectedState(format!(
                "transaction {} is '{}', not awaiting approval",
                tx.id, tx.remote_status
            )));
        }

        let record = self
            .gateway
            .submit_approval(&tx.wallet_address, &tx.id, &signer_id, &signature_hex)
            .await?;
        let updated = Transaction::from_record(&tx.wallet_address, &tx.chain, record);
        check_progress(tx, &updated)?;

        tracing::info!(
            transaction_id = %updated.id,
            signature = %signature.short(),
            remote_status = %updated.remote_status,
            "Approval accepted"
        );
        Ok(updated)
    }

    /// Fetch the transaction, then approve it. Safe to repeat with the same
    /// signature.
    pub async fn submit_approval(
        &self,
        wallet_address: &str,
        chain: &str,
        transaction_id: &str,
        signer_id: Option<&str>,
        signature: &OperationSignature,
    ) -> OrchestratorResult<Transaction> {
        let current = self
            .get_transaction(wallet_address, chain, transaction_id)
            .await?;
        self.approve(&current, signer_id, signature).await
    }

    /// Fetch a snapshot. `chain` is kept when the service does not echo the
    /// transaction's params.
    pub async fn get_transaction(
        &self,
        wallet_address: &str,
        chain: &str,
        transaction_id: &str,
    ) -> OrchestratorResult<Transaction> {
        let record = self
            .gateway
            .get_transaction(wallet_address, transaction_id)
            .await?;
        Ok(Transaction::from_record(wallet_address, chain, record))
    }

    /// Wait `delay`, then poll once and report whatever the service says.
    pub async fn poll_once_after(
        &self,
        wallet_address: &str,
        chain: &str,
        transaction_id: &str,
        delay: Duration,
    ) -> OrchestratorResult<Transaction> {
        tokio::time::sleep(delay).await;
        self.get_transaction(wallet_address, chain, transaction_id).await
    }

    /// Poll until the transaction is `Confirmed` or `Failed`.
    ///
    /// Bounded by the polling configuration and cancellable through `cancel`.
    /// A backward move or a changed user operation hash ends the wait with
    /// `UnexpectedState`.
    pub async fn await_settlement(
        &self,
        tx: &Transaction,
        cancel: &CancelToken,
    ) -> OrchestratorResult<Transaction> {
        if tx.is_settled() {
            return Ok(tx.clone());
        }

        let policy = PollPolicy::from_config(&self.polling);
        let last_seen = Mutex::new(tx.clone());

        let settled = poll_until(&policy, cancel, "transaction", |attempt| {
            let last_seen = &last_seen;
            async move {
                let current = self
                    .get_transaction(&tx.wallet_address, &tx.chain, &tx.id)
                    .await?;
                {
                    let mut previous = last_seen.lock().unwrap_or_else(|e| e.into_inner());
                    check_progress(&previous, &current)?;
                    if previous.state != current.state {
                        tracing::info!(
                            transaction_id = %current.id,
                            from = ?previous.state,
                            to = ?current.state,
                            "Transaction state changed"
                        );
                    }
                    *previous = current.clone();
                }

                tracing::debug!(
                    transaction_id = %current.id,
                    attempt,
                    remote_status = %current.remote_status,
                    "Polled transaction"
                );
                if current.is_settled() {
                    Ok(PollStatus::Ready(current))
                } else {
                    Ok(PollStatus::Pending)
                }
            }
        })
        .await;

        match &settled {
            Ok(final_tx) if final_tx.state == Some(TransactionState::Confirmed) => {
                metrics::record_transaction("confirmed")
            }
            Ok(_) => metrics::record_transaction("failed"),
            Err(e) => metrics::record_transaction(e.kind()),
        }
        settled
    }

    /// Create an ERC20 transfer, sign it and submit the approval.
    ///
    /// Does not wait for confirmation; follow with [`Self::await_settlement`].
    pub async fn transfer(&self, request: TransferRequest) -> OrchestratorResult<TransferOutcome> {
        if request.amount.is_zero() {
            return Err(OrchestratorError::Validation(
                "transfer amount must be greater than zero".to_string(),
            ));
        }

        let call = self.build_transfer_call(request.to, &request.amount)?;
        tracing::info!(
            from = %request.from_wallet,
            to = %request.to,
            base_units = %request.amount.base_units(),
            chain = %request.chain,
            "Starting transfer"
        );

        let tx = self
            .create_transaction(&request.from_wallet, &request.chain, &[call])
            .await?;

        let Some(key) = request.signer.as_ref() else {
            tracing::info!(transaction_id = %tx.id, "No signer supplied, awaiting signature");
            return Ok(TransferOutcome::AwaitingSignature(tx));
        };

        let signature = self.sign(key, &tx)?;
        let submitted = self.approve(&tx, None, &signature).await?;
        Ok(TransferOutcome::Submitted(submitted))
    }
}

/// Reject moves the state machine forbids between two snapshots of the same
/// transaction.
fn check_progress(previous: &Transaction, current: &Transaction) -> OrchestratorResult<()> {
    if let (Some(before), Some(after)) = (
        previous.user_operation_hash.as_deref(),
        current.user_operation_hash.as_deref(),
    ) {
        if !before.eq_ignore_ascii_case(after) {
            return Err(OrchestratorError::UnexpectedState(format!(
                "user operation hash of {} changed from {} to {}",
                current.id, before, after
            )));
        }
    }

    if let (Some(before), Some(after)) = (previous.state, current.state) {
        if !before.can_transition_to(after) {
            return Err(OrchestratorError::UnexpectedState(format!(
                "transaction {} moved from {} back to {}",
                current.id, before, after
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::TransactionRecord;

    fn snapshot(status: &str, hash: Option<&str>) -> Transaction {
        let mut record: TransactionRecord =
            serde_json::from_value(serde_json::json!({"id": "tx-1", "status": status})).unwrap();
        record.on_chain.user_operation_hash = hash.map(str::to_string);
        Transaction::from_record("0xwallet", "base-sepolia", record)
    }

    #[test]
    fn test_check_progress_forward() {
        let before = snapshot("awaiting-approval", Some("0xaa"));
        let after = snapshot("pending", Some("0xAA"));
        assert!(check_progress(&before, &after).is_ok());
    }

    #[test]
    fn test_check_progress_backward() {
        let before = snapshot("pending", Some("0xaa"));
        let after = snapshot("awaiting-approval", Some("0xaa"));
        assert!(matches!(
            check_progress(&before, &after),
            Err(OrchestratorError::UnexpectedState(_))
        ));
    }

    #[test]
    fn test_check_progress_hash_change() {
        let before = snapshot("pending", Some("0xaa"));
        let after = snapshot("pending", Some("0xbb"));
        assert!(check_progress(&before, &after).is_err());
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let before = snapshot("pending", Some("0xaa"));
        let after = snapshot("queued-for-bundler", Some("0xaa"));
        assert!(check_progress(&before, &after).is_ok());
    }
}
