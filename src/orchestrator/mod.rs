//! Transaction orchestration.
//!
//! # Data Flow
//! ```text
//! caller
//!     → transfer.rs: build call → gateway.create_transaction
//!     → signing engine: sign user operation hash
//!     → gateway.submit_approval
//!     → await_settlement: poll gateway.get_transaction with backoff
//!     → Transaction snapshot back to the caller
//! ```
//!
//! State rules live in state.rs; flow.rs strings the steps into the full
//! create/fund/transfer/settle demonstration.

pub mod flow;
pub mod state;
pub mod transfer;

pub use flow::{run_automated_flow, FlowParams, FlowReport};
pub use state::{Transaction, TransactionState};
pub use transfer::{TransactionOrchestrator, TransferOutcome, TransferRequest};
