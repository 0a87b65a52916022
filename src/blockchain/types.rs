//! Signing error definitions.

use thiserror::Error;

/// Errors raised by the signing engine. None of these involve I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// The private key or the operation hash was missing.
    #[error("Missing input: {0} is required")]
    EmptyInput(&'static str),

    /// The hash is not a `0x`-prefixed, even-length hex string.
    #[error("Invalid user operation hash format: {0}")]
    InvalidHashFormat(String),

    /// The key does not parse as a secp256k1 scalar.
    #[error("Invalid private key format: {0}")]
    InvalidKeyFormat(String),

    /// A signature supplied from outside is not 65 bytes of hex.
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// The signer rejected a well-formed key and message.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Result type for signing operations.
pub type SigningResult<T> = Result<T, SigningError>;
