//! Conversions between UTC instants and the scheduling axis.
//!
//! The engine places every interval on a single axis: seconds since the Unix
//! epoch (1970-01-01 00:00:00 UTC), carried as `Quantity<Second>`. Whole
//! seconds are exactly representable in `f64` for any realistic date, so
//! intervals built from `chrono` instants compare exactly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use qtty::{Quantity, Second};

use crate::intervals::Interval;

/// A point on the scheduling axis.
pub type Instant = Quantity<Second>;

/// A half-open UTC window on the scheduling axis.
pub type TimeWindow = Interval<Second>;

/// Seconds in one civil day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts a UTC instant to the scheduling axis.
pub fn to_axis(dt: DateTime<Utc>) -> Instant {
    Quantity::new(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9)
}

/// Converts an axis value back to a UTC instant.
///
/// Returns `None` for values outside the range `chrono` can represent.
pub fn from_axis(value: Instant) -> Option<DateTime<Utc>> {
    let secs = value.value();
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Builds `[start, end)` from two UTC instants, or `None` if it would be empty.
pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<TimeWindow> {
    Interval::checked(to_axis(start), to_axis(end))
}

/// Axis value of `date` at `time` (UTC).
pub fn at(date: NaiveDate, time: NaiveTime) -> Instant {
    to_axis(date.and_time(time).and_utc())
}

/// Formats a window as an RFC 3339 pair, for log lines.
///
/// Bounds outside the calendar range are printed as raw axis seconds.
pub fn describe(window: &TimeWindow) -> String {
    format!("[{}, {})", stamp(window.start()), stamp(window.end()))
}

fn stamp(value: Instant) -> String {
    from_axis(value)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{:.3}s", value.value()))
}
