//! # Entry Time Helpers
//!
//! Drinks are logged with an hour and a quarter-hour picked from a short list, with
//! no date. These helpers propose a default pick and turn a pick back into an
//! instant.
//!
//! ## Day Resolution
//!
//! A bare `HH:MM` is ambiguous around midnight. [`resolve_entry_time`] applies a
//! best-effort heuristic, in order:
//! 1. **Late night**: if the same wall-clock time *tomorrow* is less than 3 h ahead,
//!    use tomorrow (00:30 picked at 23:45 means "in 45 minutes")
//! 2. **Today**: otherwise take today's date; if that is more than 3 h ahead, assume
//!    yesterday was meant (23:30 picked at 00:15 means "45 minutes ago")
//! 3. **Stale**: if the result is more than 24 h in the past, move it forward a day
//!
//! Someone logging a drink from two evenings ago will get the wrong day. The
//! heuristic only covers the common case of logging during or just after a night out.

use crate::BacError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};

/// How far ahead a picked time may lie and still count as a near-future entry
const NEAR_FUTURE_HOURS: i64 = 3;

/// Offset of the proposed next entry after the previous drink
const NEXT_ENTRY_GAP_MINUTES: i64 = 30;

/// Hour and minute on a 15-minute grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuarterHour {
    pub hour: u32,
    pub minute: u32,
}

/// A selectable value with its zero-padded label, e.g. `(5, "05")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeOption {
    pub value: u32,
    pub label: String,
}

/// Everything a time picker offers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeOptions {
    /// 0 through 23
    pub hours: Vec<TimeOption>,
    /// 0, 15, 30, 45
    pub minutes: Vec<TimeOption>,
}

/// Truncate an instant's wall-clock minutes to the previous quarter hour.
///
/// # Example
/// ```
/// use bac_tracker_lib::time_utils::{round_down_to_quarter_hour, QuarterHour};
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 7, 24, 21, 44, 59).unwrap();
/// assert_eq!(round_down_to_quarter_hour(&at), QuarterHour { hour: 21, minute: 30 });
/// ```
pub fn round_down_to_quarter_hour<Tz: TimeZone>(instant: &DateTime<Tz>) -> QuarterHour {
    QuarterHour {
        hour: instant.hour(),
        minute: instant.minute() / 15 * 15,
    }
}

/// Hours 0-23 and the four quarter-hour minutes.
pub fn time_options() -> TimeOptions {
    let option = |value: u32| TimeOption {
        value,
        label: format!("{value:02}"),
    };

    TimeOptions {
        hours: (0..24).map(option).collect(),
        minutes: (0..4).map(|i| option(i * 15)).collect(),
    }
}

/// Signed gap `a - b` between two instants in the same zone.
fn gap<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> Duration {
    a.naive_utc() - b.naive_utc()
}

/// Turn a date-less `hour:minute` pick into an instant near `now`.
///
/// See the module docs for the day-resolution rules. During a DST fold the
/// earlier of the two instants is used; a time that does not exist on the chosen
/// day (DST gap) is rejected with [`BacError::InvalidTime`].
pub fn resolve_entry_time<Tz: TimeZone>(
    hour: u32,
    minute: u32,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>, BacError> {
    let invalid = || BacError::InvalidTime { hour, minute };

    let wall = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
    let tz = now.timezone();
    let at_day = |date: NaiveDate| tz.from_local_datetime(&date.and_time(wall)).earliest();

    let today = now.date_naive();
    let near_future = Duration::hours(NEAR_FUTURE_HOURS);

    if let Some(tomorrow) = today.succ_opt().and_then(at_day) {
        let ahead = gap(&tomorrow, now);
        if ahead > Duration::zero() && ahead < near_future {
            return Ok(tomorrow);
        }
    }

    let selected = at_day(today).ok_or_else(invalid)?;
    let ahead = gap(&selected, now);

    if ahead > near_future {
        return today.pred_opt().and_then(at_day).ok_or_else(invalid);
    }
    if -ahead > Duration::hours(24) {
        return today.succ_opt().and_then(at_day).ok_or_else(invalid);
    }

    Ok(selected)
}

/// Default pick for the next entry.
///
/// Thirty minutes after the previous drink while that drink is less than a day
/// old, otherwise the current time; either way rounded down to the quarter hour.
pub fn next_entry_default<Tz: TimeZone>(
    last_drink: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> QuarterHour {
    match last_drink {
        Some(last) if gap(now, last) < Duration::hours(24) => {
            let proposed = last.clone() + Duration::minutes(NEXT_ENTRY_GAP_MINUTES);
            round_down_to_quarter_hour(&proposed)
        }
        _ => round_down_to_quarter_hour(now),
    }
}
