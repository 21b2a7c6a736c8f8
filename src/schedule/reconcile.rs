//! Reconciliation of local schedule state against the provider's view.

use chrono::{DateTime, Utc};

use crate::provider::types::ProviderScheduleState;
use crate::schedule::types::{ReconcileError, RecurringPaymentSchedule, ScheduleStatus};

/// Map the provider's status vocabulary onto the local model.
///
/// The table is exhaustive over the vocabulary the provider is known to
/// use. Anything else returns `None` and the caller fails loudly instead
/// of guessing.
pub fn map_provider_status(raw: &str) -> Option<ScheduleStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "active" | "ongoing" | "processing" | "pending" => Some(ScheduleStatus::Active),
        "suspended" | "paused" => Some(ScheduleStatus::Paused),
        "cancelled" | "canceled" | "completed" | "expired" | "terminated" | "failed" => {
            Some(ScheduleStatus::Stopped)
        }
        _ => None,
    }
}

/// Apply the provider's current view to a local record.
///
/// Refreshes the next-execution timestamp and applies the status the
/// provider reported — never a transition it did not. On unknown
/// vocabulary the record is left completely untouched.
///
/// Returns whether the status changed.
pub fn apply_provider_state(
    schedule: &mut RecurringPaymentSchedule,
    state: &ProviderScheduleState,
    now: DateTime<Utc>,
) -> Result<bool, ReconcileError> {
    let mapped =
        map_provider_status(&state.status).ok_or_else(|| ReconcileError::UnknownProviderStatus {
            schedule_id: schedule.id,
            status: state.status.clone(),
        })?;

    schedule.next_execution = state.next_execution_date;

    let transitioned = schedule.status != mapped;
    if transitioned {
        tracing::info!(
            schedule_id = %schedule.id,
            from = ?schedule.status,
            to = ?mapped,
            "Provider reported schedule transition"
        );
        schedule.status = mapped;
    }
    schedule.updated_at = now;

    Ok(transitioned)
}
