use chrono::{NaiveDate, NaiveTime, Weekday};
use thiserror::Error;

/// Reasons an availability rule is rejected as malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule date range is inverted: {to} is before {from}")]
    DateRangeInverted { from: NaiveDate, to: NaiveDate },

    #[error("Rule time range is empty or inverted on {day:?}: {start} -> {end}")]
    TimeRangeInverted {
        /// `None` for ONCE/DAILY rules, the offending weekday for WEEKLY ones.
        day: Option<Weekday>,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Weekly rule has no weekday with a start/end pair")]
    EmptyWeek,

    #[error("Horizon {0} is outside the representable date range")]
    HorizonOutOfRange(String),

    #[error("Rule {rule} belongs to channel {rule_channel}, not {table_channel}")]
    ForeignChannel {
        rule: String,
        rule_channel: String,
        table_channel: String,
    },
}
