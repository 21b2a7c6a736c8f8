//! Custodial Payment Gateway Library
//!
//! Moves stablecoin value for organizations and their payees through an
//! external MPC custody provider. Three components do the dangerous work:
//! the credential vault, the two-phase transaction signing protocol, and
//! the standing order lifecycle manager. The UI/API layer is an external
//! consumer of this crate's types and operations.

pub mod config;
pub mod lifecycle;
pub mod notify;
pub mod provider;
pub mod resilience;
pub mod schedule;
pub mod signing;
pub mod vault;

pub use config::GatewayConfig;
pub use schedule::ScheduleManager;
pub use signing::TransferSigner;
pub use vault::Vault;
