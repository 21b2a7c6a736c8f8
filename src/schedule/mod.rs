//! Standing order lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Creation:
//!     CreateScheduleRequest
//!     → validation.rs (payee, amount, date normalization; pre-provider)
//!     → provider (create schedule, may return activation payload)
//!     → signing protocol (mandatory activation with owner's credentials)
//!     → store.rs (persist Active, or degraded ActivationFailed)
//!
//! Reconciliation (periodic):
//!     store.rs (locally active schedules with external ids)
//!     → provider (bounded-parallel fetch of current views)
//!     → reconcile.rs (exhaustive status mapping, apply)
//!     → store.rs (overwrite with latest)
//! ```
//!
//! # Design Decisions
//! - Every validation rule runs before the first provider call
//! - Activation failure persists a degraded record instead of dropping
//!   the only local pointer to the remote schedule
//! - Pause/resume/stop are local-only soft states; the provider has no
//!   pause primitive and the remote schedule keeps executing
//! - Reconciliation never invents a transition the provider did not
//!   report, and one schedule's failure never blocks the rest

pub mod manager;
pub mod reconcile;
pub mod store;
pub mod types;
pub mod validation;

pub use manager::ScheduleManager;
pub use store::ScheduleStore;
pub use types::{
    CreateScheduleRequest, CreatedSchedule, Frequency, ReconcileSummary,
    RecurringPaymentSchedule, ScheduleError, ScheduleStatus, ValidationError,
};
