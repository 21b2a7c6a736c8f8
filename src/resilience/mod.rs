//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Submit phase of the signing protocol:
//!     → attempt submission
//!     → on retryable (network-class) failure: backoff.rs delay, retry
//!     → on permanent provider rejection: fail immediately
//! ```
//!
//! # Design Decisions
//! - Every provider call has a deadline; deadlines live in the clients
//! - Only the submit phase is retried, never prepare or sign
//! - Jittered backoff prevents synchronized retry bursts

pub mod backoff;

pub use backoff::RetryPolicy;
