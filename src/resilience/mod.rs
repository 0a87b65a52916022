//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Waiting on remote settlement:
//!     → poll.rs (settle delay, check, repeat until ready)
//!     → backoff.rs (exponential delay with jitter between checks)
//!     → cancel.rs (caller-driven abort of the whole wait)
//! ```
//!
//! # Design Decisions
//! - Every wait has a deadline and an attempt bound
//! - Probe errors end the wait immediately; they are not retried
//! - Cancellation is observed at every await point

pub mod backoff;
pub mod cancel;
pub mod poll;

pub use backoff::Backoff;
pub use cancel::CancelToken;
pub use poll::{poll_until, PollPolicy, PollStatus};
