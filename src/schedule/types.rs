//! Standing order records, requests, and error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::provider::types::ProviderError;
use crate::signing::types::TransferError;
use crate::vault::cipher::VaultError;

/// How often a standing order executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    /// Minimum window between start and end.
    pub fn minimum_duration_days(self) -> i64 {
        match self {
            Frequency::Weekly => 7,
            Frequency::Monthly => 30,
        }
    }

    /// Cycles used for the default end date when none is requested.
    pub fn default_cycles(self) -> u32 {
        match self {
            Frequency::Weekly => 4,
            Frequency::Monthly => 3,
        }
    }
}

/// Local schedule state machine.
///
/// `Validating → SubmittedToProvider → Activating → Active → {Paused | Stopped}`.
/// `Stopped` is terminal. `ActivationFailed` is the degraded state for a
/// schedule the provider accepted but whose on-chain activation did not
/// complete; it needs manual reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Validating,
    SubmittedToProvider,
    Activating,
    Active,
    Paused,
    Stopped,
    ActivationFailed,
}

impl ScheduleStatus {
    pub fn is_terminal(self) -> bool {
        self == ScheduleStatus::Stopped
    }
}

/// One employer→payee recurring transfer. Never deleted; soft-stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPaymentSchedule {
    pub id: Uuid,
    /// The user whose vault credentials authorize this schedule.
    pub owner: Uuid,
    pub payer_account: String,
    pub payee_address: String,
    /// Fixed-point integer in the asset's smallest unit.
    pub amount_units: u64,
    pub asset: String,
    pub frequency: Frequency,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub external_id: Option<String>,
    pub next_execution: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request from the UI/API layer to create a standing order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleRequest {
    pub owner: Uuid,
    pub payer_account: String,
    /// Onboarded payee, identified by email. Mutually exclusive with
    /// `destination_address`.
    pub payee_email: Option<String>,
    /// Bare destination address requiring no onboarding.
    pub destination_address: Option<String>,
    /// Decimal amount, e.g. "50.00".
    pub amount: String,
    pub frequency: Frequency,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Successful creation result returned to the UI/API layer.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSchedule {
    pub schedule_id: Uuid,
    pub external_id: String,
    pub next_execution: Option<DateTime<Utc>>,
}

/// A schedule request violated a date or amount invariant.
///
/// Messages state the exact failing rule; these are shown to users.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("exactly one of payee email or destination address must be supplied")]
    PayeeSelection,

    #[error("payee {0} is not onboarded with the custody provider")]
    PayeeNotOnboarded(String),

    #[error("amount {0:?} is not a valid decimal amount")]
    AmountFormat(String),

    #[error("amount of {units} units is below the minimum transfer of {minimum_units} units")]
    AmountBelowMinimum { units: u64, minimum_units: u64 },

    #[error("end date must be after start date")]
    EndBeforeStart,

    #[error(
        "{frequency:?} schedules must run for at least {required_days} days; \
         the requested window is {actual_days} days, {shortfall_days} days short"
    )]
    DurationTooShort {
        frequency: Frequency,
        required_days: i64,
        actual_days: i64,
        shortfall_days: i64,
    },
}

/// Why activation could not complete after provider acceptance.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("custody provider rejected the schedule: {0}")]
    Provider(#[from] ProviderError),

    /// The single most consequential failure mode: the schedule exists
    /// remotely but is not authorized on-chain. A degraded local record
    /// is persisted under `ActivationFailed` for manual reconciliation.
    #[error(
        "schedule was accepted by the custody provider as {external_id} \
         but on-chain activation failed; manual reconciliation required"
    )]
    ActivationFailed {
        external_id: String,
        #[source]
        source: ActivationError,
    },

    #[error("schedule {0} not found")]
    NotFound(Uuid),

    #[error("schedule {id} cannot move from {from:?} to {requested:?}")]
    InvalidTransition {
        id: Uuid,
        from: ScheduleStatus,
        requested: ScheduleStatus,
    },
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileSummary {
    /// Schedules examined (locally active with an external id).
    pub examined: usize,
    /// Schedules whose provider view was applied.
    pub updated: usize,
    /// Subset of `updated` whose status changed.
    pub transitioned: usize,
    /// Per-schedule failures; never abort the batch.
    pub failed: usize,
}

/// A per-schedule reconciliation failure. Isolated and logged.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("provider fetch failed for schedule {schedule_id}: {source}")]
    Fetch {
        schedule_id: Uuid,
        #[source]
        source: ProviderError,
    },

    /// The provider used vocabulary outside the mapping table. We fail
    /// loudly and leave the local record untouched rather than guess.
    #[error("provider reported unknown status {status:?} for schedule {schedule_id}")]
    UnknownProviderStatus { schedule_id: Uuid, status: String },
}
