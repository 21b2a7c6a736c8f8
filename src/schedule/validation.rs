//! Pure normalization and validation for schedule requests.
//!
//! # Responsibilities
//! - Decimal amount → smallest-unit integer, with minimum threshold
//! - Start-date clamping (never sooner than 24h out) and execution-hour
//!   pinning to match the provider's recommended window
//! - End-date defaulting and minimum-duration enforcement
//!
//! # Design Decisions
//! - All functions are pure: time is a parameter, never read here
//! - Every rejection names the exact rule and values that failed
//! - Everything here runs before the first provider call

use chrono::{DateTime, Duration, Months, Utc};

use crate::schedule::types::{Frequency, ValidationError};

/// Convert a decimal amount string into the asset's smallest unit.
///
/// Rejects sign characters, non-digits, and more fractional digits than
/// the asset carries; money is never silently truncated.
pub fn normalize_amount(raw: &str, decimals: u32) -> Result<u64, ValidationError> {
    let trimmed = raw.trim();
    let invalid = || ValidationError::AmountFormat(raw.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if frac_part.len() as u32 > decimals {
        return Err(invalid());
    }

    let scale = 10u64.checked_pow(decimals).ok_or_else(invalid)?;
    let int_value: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };
    let frac_value: u64 = if frac_part.is_empty() {
        0
    } else {
        let digits: u64 = frac_part.parse().map_err(|_| invalid())?;
        digits * 10u64.pow(decimals - frac_part.len() as u32)
    };

    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(invalid)
}

/// Reject amounts below the configured minimum transfer threshold.
pub fn check_minimum(units: u64, minimum_units: u64) -> Result<(), ValidationError> {
    if units < minimum_units {
        return Err(ValidationError::AmountBelowMinimum {
            units,
            minimum_units,
        });
    }
    Ok(())
}

/// Pin a timestamp to the execution hour, keeping its date.
pub(crate) fn pin_to_hour(ts: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(ts)
}

/// Normalize a requested start date.
///
/// A start less than 24h out is clamped forward to now+24h; the result is
/// pinned to the execution hour, rolling one day forward if pinning would
/// land it back inside the 24h window. A start already 24h out keeps its
/// date and only has its time-of-day pinned.
pub fn normalize_start(
    requested: DateTime<Utc>,
    now: DateTime<Utc>,
    execution_hour: u32,
) -> DateTime<Utc> {
    let earliest = now + Duration::hours(24);
    if requested < earliest {
        let mut pinned = pin_to_hour(earliest, execution_hour);
        if pinned < earliest {
            pinned += Duration::days(1);
        }
        pinned
    } else {
        pin_to_hour(requested, execution_hour)
    }
}

/// Resolve the end date: default it when absent, validate it when given.
pub fn resolve_end(
    start: DateTime<Utc>,
    requested: Option<DateTime<Utc>>,
    frequency: Frequency,
    execution_hour: u32,
) -> Result<DateTime<Utc>, ValidationError> {
    let end = match requested {
        None => return Ok(default_end(start, frequency)),
        Some(end) => pin_to_hour(end, execution_hour),
    };

    if end <= start {
        return Err(ValidationError::EndBeforeStart);
    }

    let actual_days = (end - start).num_days();
    let required_days = frequency.minimum_duration_days();
    if actual_days < required_days {
        return Err(ValidationError::DurationTooShort {
            frequency,
            required_days,
            actual_days,
            shortfall_days: required_days - actual_days,
        });
    }

    Ok(end)
}

fn default_end(start: DateTime<Utc>, frequency: Frequency) -> DateTime<Utc> {
    match frequency {
        Frequency::Weekly => start + Duration::weeks(frequency.default_cycles() as i64),
        Frequency::Monthly => start + Months::new(frequency.default_cycles()),
    }
}
