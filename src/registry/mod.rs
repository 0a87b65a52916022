//! In-memory wallet registry.
//!
//! Holds the wallets created during a session so callers can pick one by
//! address or by list position. Append-only: wallets are never removed or
//! mutated, and nothing is persisted.

use std::sync::{Arc, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::gateway::types::{WalletKind, WalletRecord};

/// A wallet created through the gateway. The key of `admin_signer` is never
/// held here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    pub address: String,
    pub kind: WalletKind,
    pub admin_signer: String,
}

impl Wallet {
    /// Build from the service's record, falling back to the signer the wallet
    /// was requested with when the record omits it.
    pub fn from_record(record: &WalletRecord, requested_signer: &str) -> Self {
        let admin_signer = record
            .config
            .admin_signer
            .as_ref()
            .map(|s| s.address.clone())
            .unwrap_or_else(|| requested_signer.to_string());

        Self {
            address: record.address.clone(),
            kind: record.kind,
            admin_signer,
        }
    }
}

/// Thread-safe, ordered, address-deduplicated wallet list.
///
/// Lookups by address go through the `DashMap` without touching the ordered
/// list's lock; the list only serves positional selection and listing.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    wallets: Arc<RwLock<Vec<Wallet>>>,
    by_address: Arc<DashMap<String, Wallet>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a wallet. Returns `false` if the address is already known.
    pub fn register(&self, wallet: Wallet) -> bool {
        let slot = match self.by_address.entry(wallet.address.clone()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => slot,
        };

        // Listed before the entry is filled: anything `get` sees is also listed.
        // The list lock is only ever taken under a shard lock, never the reverse.
        self.wallets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(wallet.clone());
        tracing::debug!(address = %wallet.address, kind = %wallet.kind, "Wallet registered");
        slot.insert(wallet);
        true
    }

    pub fn get(&self, address: &str) -> Option<Wallet> {
        self.by_address.get(address).map(|w| w.value().clone())
    }

    /// Pick by 1-based position, as presented in a numbered list.
    pub fn select(&self, position: usize) -> OrchestratorResult<Wallet> {
        let wallets = self.wallets.read().unwrap_or_else(|e| e.into_inner());
        if wallets.is_empty() {
            return Err(OrchestratorError::Validation(
                "No wallets available. Please create a wallet first.".to_string(),
            ));
        }
        position
            .checked_sub(1)
            .and_then(|i| wallets.get(i))
            .cloned()
            .ok_or_else(|| {
                OrchestratorError::Validation(format!(
                    "Invalid selection {}: choose between 1 and {}",
                    position,
                    wallets.len()
                ))
            })
    }

    /// Snapshot of all wallets in creation order.
    pub fn list(&self) -> Vec<Wallet> {
        self.wallets.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.wallets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
