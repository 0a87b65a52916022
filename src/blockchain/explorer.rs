//! Block explorer links for supported chains.

/// Explorer base URL for a chain identifier, if known.
pub fn explorer_base(chain: &str) -> Option<&'static str> {
    match chain {
        "base-sepolia" => Some("https://sepolia.basescan.org"),
        "ethereum-sepolia" => Some("https://sepolia.etherscan.io"),
        "solana-devnet" => Some("https://explorer.solana.com"),
        _ => None,
    }
}

/// Link to an address page. EVM chains open on the token transfer tab.
pub fn address_url(chain: &str, address: &str) -> Option<String> {
    let base = explorer_base(chain)?;
    if chain.starts_with("solana") {
        Some(format!("{}/address/{}?cluster=devnet", base, address))
    } else {
        Some(format!("{}/address/{}#tokentxns", base, address))
    }
}
