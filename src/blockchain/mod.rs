//! Chain-side primitives: signing, call encoding and token units.
//!
//! # Data Flow
//! ```text
//! user operation hash (from the wallet service)
//!     → signing.rs (EIP-191 personal-message signature)
//!     → approval submitted through the gateway
//!
//! transfer request
//!     → units.rs (display amount → base units)
//!     → abi.rs (ERC20 transfer call payload)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables or explicit arguments
//! - Never log private keys or full signatures
//! - Nothing in this module performs I/O

pub mod abi;
pub mod explorer;
pub mod signing;
pub mod types;
pub mod units;

pub use signing::{sign_operation_hash, OperationSignature, SignerKey};
pub use types::SigningError;
pub use units::TokenAmount;
