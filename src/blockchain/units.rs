//! Fixed-point token amounts and the balance decoder.
//!
//! On-chain amounts are carried as integer base units ([`U256`]) everywhere in
//! the crate. Display strings ("50", "0.5") only exist at the boundary facing
//! people.

use std::fmt;

use alloy::primitives::U256;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Decimals of the USDC-like asset tracked by this crate.
pub const USDC_DECIMALS: u8 = 6;

/// An integer amount of base units together with the token's decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    base_units: U256,
    decimals: u8,
}

impl TokenAmount {
    pub fn from_base_units(base_units: U256, decimals: u8) -> Self {
        Self {
            base_units,
            decimals,
        }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::from_base_units(U256::ZERO, decimals)
    }

    /// Parse a human amount such as `"50"` or `"0.25"` into base units.
    ///
    /// Rejects signs, exponents and more fractional digits than `decimals`.
    pub fn parse_display(amount: &str, decimals: u8) -> OrchestratorResult<Self> {
        let amount = amount.trim();
        let invalid = |reason: &str| {
            OrchestratorError::Validation(format!("invalid amount '{}': {}", amount, reason))
        };

        let (whole, fraction) = match amount.split_once('.') {
            Some((w, f)) => (w, f),
            None => (amount, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("only digits and one decimal point are allowed"));
        }
        if fraction.len() > decimals as usize {
            return Err(invalid("too many fractional digits"));
        }

        let whole_units = if whole.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(whole, 10).map_err(|e| invalid(&e.to_string()))?
        };
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        let fraction_units = if padded.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(&padded, 10).map_err(|e| invalid(&e.to_string()))?
        };

        let base_units = whole_units
            .checked_mul(scale(decimals))
            .and_then(|v| v.checked_add(fraction_units))
            .ok_or_else(|| invalid("overflow"))?;

        Ok(Self::from_base_units(base_units, decimals))
    }

    pub fn base_units(&self) -> U256 {
        self.base_units
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.base_units.is_zero()
    }

    /// Lossy conversion for UIs that want a plain number.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = scale(self.decimals);
        let whole = self.base_units / unit;
        let fraction = self.base_units % unit;

        if fraction.is_zero() {
            return write!(f, "{}", whole);
        }

        let digits = format!("{:0>width$}", fraction.to_string(), width = self.decimals as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TokenAmount", 3)?;
        state.serialize_field("base_units", &self.base_units.to_string())?;
        state.serialize_field("decimals", &self.decimals)?;
        state.serialize_field("amount", &self.to_string())?;
        state.end()
    }
}

fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Decode a hex-encoded balance (with or without `0x`) into a token amount.
pub fn decode_balance(hex_balance: &str, decimals: u8) -> OrchestratorResult<TokenAmount> {
    let trimmed = hex_balance.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(OrchestratorError::MalformedResponse(format!(
            "empty token balance '{}'",
            hex_balance
        )));
    }

    let base_units = U256::from_str_radix(digits, 16).map_err(|e| {
        OrchestratorError::MalformedResponse(format!(
            "invalid token balance '{}': {}",
            hex_balance, e
        ))
    })?;

    Ok(TokenAmount::from_base_units(base_units, decimals))
}
