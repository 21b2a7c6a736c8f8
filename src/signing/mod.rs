//! Transaction signing protocol.
//!
//! # Data Flow
//! ```text
//! Money movement:
//!     TransferIntent
//!     → prepare (privileged client, API key)
//!     → sign (signing client, caller's decrypted credential bundle)
//!     → submit (signing client; network-class failures retried)
//!     → SubmitReceipt
//! ```
//!
//! # Design Decisions
//! - Phase 2 is never attempted unless phase 1 succeeded
//! - Sign is never re-run on submit failure; a crash between sign and
//!   submit leaves a valid signed payload and only submit is retried
//! - The credential/session pair is atomic; partial bundles are rejected
//!   before any provider call
//! - No idempotency here: callers mint and persist their own key before
//!   phase 1 when they need exactly-once delivery

pub mod protocol;
pub mod types;

pub use protocol::TransferSigner;
pub use types::{SigningError, SubmissionError, TransferError, TransferIntent};
