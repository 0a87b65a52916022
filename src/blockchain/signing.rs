//! Signing engine for user operation approvals.
//!
//! The wallet service hands back a user operation hash; the admin signer of
//! the smart wallet approves it by signing the raw hash bytes as an Ethereum
//! personal message (EIP-191: `"\x19Ethereum Signed Message:\n" + len + msg`).
//!
//! # Security
//! - Keys are parsed on demand and never logged or serialized
//! - Signing is deterministic (RFC 6979) and holds no shared state

use alloy::hex;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};

use crate::blockchain::types::{SigningError, SigningResult};

/// Environment variable holding the admin signer's private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "SIGNER_PRIVATE_KEY";

/// A parsed secp256k1 private key.
#[derive(Clone)]
pub struct SignerKey {
    signer: PrivateKeySigner,
}

impl SignerKey {
    /// Parse a hex-encoded private key (with or without `0x`).
    pub fn from_private_key(private_key_hex: &str) -> SigningResult<Self> {
        let trimmed = private_key_hex.trim();
        if trimmed.is_empty() {
            return Err(SigningError::EmptyInput("private key"));
        }

        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SigningError::InvalidKeyFormat(format!("{}", e)))?;

        Ok(Self { signer })
    }

    /// Load the key from `SIGNER_PRIVATE_KEY`.
    pub fn from_env() -> SigningResult<Self> {
        Self::from_env_optional()?.ok_or(SigningError::EmptyInput("private key"))
    }

    /// Load the key from `SIGNER_PRIVATE_KEY` if it is set. An unset or blank
    /// variable is `None`; a malformed key is still an error.
    pub fn from_env_optional() -> SigningResult<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// [`Self::from_env_optional`] with `lookup` standing in for `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> SigningResult<Option<Self>>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        match lookup(PRIVATE_KEY_ENV_VAR) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Self::from_private_key(&value).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(SigningError::InvalidKeyFormat(e.to_string())),
        }
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Address derived from the public key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Hex encoding of the secret scalar. Only meant for key generation output.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signer.to_bytes()))
    }

    /// Sign a `0x`-prefixed user operation hash.
    pub fn sign(&self, operation_hash: &str) -> SigningResult<OperationSignature> {
        let message = parse_operation_hash(operation_hash)?;
        self.sign_bytes(&message)
    }

    fn sign_bytes(&self, message: &[u8]) -> SigningResult<OperationSignature> {
        let signature = self
            .signer
            .sign_message_sync(message)
            .map_err(|e| SigningError::SigningFailed(e.to_string()))?;
        Ok(OperationSignature { signature })
    }
}

impl std::fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerKey")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

/// A 65-byte `r || s || v` signature over a user operation hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSignature {
    signature: Signature,
}

impl OperationSignature {
    /// Parse a signature produced elsewhere, e.g. by a hardware wallet.
    pub fn from_hex(signature_hex: &str) -> SigningResult<Self> {
        let trimmed = signature_hex.trim();
        if trimmed.is_empty() {
            return Err(SigningError::EmptyInput("signature"));
        }
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| SigningError::InvalidSignatureFormat(e.to_string()))?;
        let signature = Signature::try_from(bytes.as_slice())
            .map_err(|e| SigningError::InvalidSignatureFormat(e.to_string()))?;
        Ok(Self { signature })
    }

    /// Raw `r || s || v` bytes, `v` in {27, 28}.
    pub fn as_bytes(&self) -> [u8; 65] {
        self.signature.as_bytes()
    }

    /// `0x`-prefixed hex, the form the wallet service expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}…", &full[..10])
    }

    /// Recover the signer address for the given operation hash.
    pub fn recover_signer(&self, operation_hash: &str) -> SigningResult<Address> {
        let message = parse_operation_hash(operation_hash)?;
        self.signature
            .recover_address_from_msg(&message)
            .map_err(|e| SigningError::InvalidHashFormat(format!("recovery failed: {}", e)))
    }
}

impl std::fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Decode a user operation hash into the message bytes that get signed.
///
/// Requires a `0x` prefix and an even number of hex digits. No length is
/// enforced beyond that.
pub fn parse_operation_hash(operation_hash: &str) -> SigningResult<Vec<u8>> {
    if operation_hash.is_empty() {
        return Err(SigningError::EmptyInput("user operation hash"));
    }

    let digits = operation_hash
        .strip_prefix("0x")
        .ok_or_else(|| SigningError::InvalidHashFormat("missing 0x prefix".to_string()))?;

    if digits.len() % 2 != 0 {
        return Err(SigningError::InvalidHashFormat(
            "odd number of hex digits".to_string(),
        ));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SigningError::InvalidHashFormat(
            "non-hex characters".to_string(),
        ));
    }

    hex::decode(digits).map_err(|e| SigningError::InvalidHashFormat(e.to_string()))
}

/// Sign `operation_hash` with `private_key`.
///
/// Validation order: missing key, missing hash, hash format, key format.
pub fn sign_operation_hash(
    private_key: &str,
    operation_hash: &str,
) -> SigningResult<OperationSignature> {
    if private_key.trim().is_empty() {
        return Err(SigningError::EmptyInput("private key"));
    }
    let message = parse_operation_hash(operation_hash)?;
    let key = SignerKey::from_private_key(private_key)?;
    key.sign_bytes(&message)
}
