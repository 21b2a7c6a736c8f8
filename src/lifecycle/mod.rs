//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Read secrets → Build clients/stores
//!     → Spawn reconciliation loop
//!
//! Shutdown (shutdown.rs):
//!     ctrl-c → broadcast signal → loop drains → stores snapshot → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then secrets, then subsystems
//! - Shutdown never interrupts a signing protocol run mid-phase

pub mod shutdown;

pub use shutdown::Shutdown;
