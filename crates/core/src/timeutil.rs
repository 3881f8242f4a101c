//! Local date/time formatting and window predicates.
//!
//! The system is timezone-naive on purpose: plan dates are `YYYY-MM-DD`
//! strings and plan times are `HH:MM` strings in the user's wall clock.
//! Two users in different zones with the same wall-clock reading produce
//! the same strings.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::Timestamp;

/// Date format used by `study_plan.date` and `daily_log.date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format used by `study_plan.start_time` / `end_time`.
pub const TIME_FORMAT: &str = "%H:%M";

/// Format the local calendar day, e.g. `"2026-03-14"`.
pub fn local_date(now: NaiveDateTime) -> String {
    now.format(DATE_FORMAT).to_string()
}

/// Format the local wall-clock time, e.g. `"09:05"`.
pub fn local_time(now: NaiveDateTime) -> String {
    now.format(TIME_FORMAT).to_string()
}

/// The calendar day after `now`'s local day.
pub fn tomorrow(now: NaiveDateTime) -> String {
    local_date(now + Duration::days(1))
}

/// UTC midnight of the day containing `now`.
///
/// This is the lower bound of the idempotency ledger's window.
pub fn utc_day_start(now: Timestamp) -> Timestamp {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Parse an `HH:MM` (optionally `HH:MM:SS`) string into hours and minutes.
///
/// Returns `None` for anything non-numeric or out of range.
pub fn parse_hhmm(hhmm: &str) -> Option<(u32, u32)> {
    let mut parts = hhmm.trim().split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    if let Some(seconds) = parts.next() {
        seconds.parse::<u32>().ok()?;
    }
    if parts.next().is_some() || hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

/// Resolve a plan's `date` + `HH:MM` into a local instant.
pub fn local_instant(hhmm: &str, date: &str) -> Option<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    let (hours, minutes) = parse_hhmm(hhmm)?;
    let time = NaiveTime::from_hms_opt(hours, minutes, 0)?;
    Some(day.and_time(time))
}

/// Whether `now` is at or after `hhmm` on `date`.
///
/// Malformed times or dates yield `false`.
pub fn has_time_passed(hhmm: &str, date: &str, now: NaiveDateTime) -> bool {
    local_instant(hhmm, date).is_some_and(|at| now >= at)
}
