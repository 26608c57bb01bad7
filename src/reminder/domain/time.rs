//! Pure time math for reminder scheduling.
//!
//! Everything here is deterministic and side-effect free: callers supply
//! `now` explicitly. The wall-clock values are naive because scheduling
//! follows the device's local clock; there is no timezone arithmetic.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// How far a past-due pick is pushed forward instead of being rejected.
const CLAMP_FORWARD_MINUTES: i64 = 1;

/// Combines a calendar date with a wall-clock time into an absolute fire
/// instant, truncating sub-second precision.
#[must_use]
pub fn fire_instant(due_date: NaiveDate, due_time: NaiveTime) -> NaiveDateTime {
    due_date.and_time(truncate_subseconds(due_time))
}

/// Milliseconds from `now` until `fire`.
///
/// Zero or negative means the instant is due now or already past.
#[must_use]
pub fn milliseconds_until(fire: NaiveDateTime, now: NaiveDateTime) -> i64 {
    fire.signed_duration_since(now).num_milliseconds()
}

/// Computes the effective fire instant for a user-picked date/time.
///
/// A pick at or before `now` is clamped forward to `now + 1 minute` rather
/// than rejected; silently failing to schedule is the one behaviour this
/// engine forbids.
#[must_use]
pub fn clamped_fire_instant(
    due_date: NaiveDate,
    due_time: NaiveTime,
    now: NaiveDateTime,
) -> NaiveDateTime {
    let fire = fire_instant(due_date, due_time);
    if fire <= now {
        truncate_datetime_subseconds(now) + Duration::minutes(CLAMP_FORWARD_MINUTES)
    } else {
        fire
    }
}

/// Renders the time remaining until `fire` using the largest non-zero unit
/// among days, hours, minutes, and seconds.
///
/// Confirmation text only; never a timing source of truth.
#[must_use]
pub fn human_remaining(fire: NaiveDateTime, now: NaiveDateTime) -> String {
    let remaining = fire.signed_duration_since(now);
    if remaining <= Duration::zero() {
        return "due now".to_owned();
    }
    let days = remaining.num_days();
    if days > 0 {
        return format_unit(days, "day");
    }
    let hours = remaining.num_hours();
    if hours > 0 {
        return format_unit(hours, "hour");
    }
    let minutes = remaining.num_minutes();
    if minutes > 0 {
        return format_unit(minutes, "minute");
    }
    format_unit(remaining.num_seconds().max(1), "second")
}

/// Renders a fire instant as the task-list due line, e.g. `Tue, 23 10:00pm`.
#[must_use]
pub fn format_due(fire: NaiveDateTime) -> String {
    fire.format("%a, %-d %-I:%M%P").to_string()
}

fn truncate_subseconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

fn truncate_datetime_subseconds(instant: NaiveDateTime) -> NaiveDateTime {
    instant.with_nanosecond(0).unwrap_or(instant)
}

fn format_unit(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}
