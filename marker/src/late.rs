//! Lateness and late-penalty arithmetic.

use chrono::{DateTime, Utc};

/// Largest late penalty, in percent.
pub const MAX_PENALTY_PERCENT: u32 = 50;

/// Penalty per day late, in percent.
pub const PENALTY_PER_DAY_PERCENT: u32 = 10;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Whole days `submitted` falls after `due`. Any part of a day counts as a full day;
/// on-time and early submissions are 0 days late.
pub fn days_late(due: DateTime<Utc>, submitted: DateTime<Utc>) -> u32 {
    let seconds = (submitted - due).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// `min(50, days * 10)` percent.
pub fn penalty_percent(days_late: u32) -> u32 {
    days_late
        .saturating_mul(PENALTY_PER_DAY_PERCENT)
        .min(MAX_PENALTY_PERCENT)
}
