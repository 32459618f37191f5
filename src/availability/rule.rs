//! Declarative availability rules for ground-station channels.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::error::RuleError;
use crate::Id;

/// Whether a rule adds availability or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Remove,
}

/// Time-of-day bounds `[start, end)` within one civil day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    fn validate(&self, day: Option<Weekday>) -> Result<(), RuleError> {
        if self.end <= self.start {
            return Err(RuleError::TimeRangeInverted {
                day,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Up to seven independent time ranges, one per weekday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTimes([Option<TimeRange>; 7]);

impl WeeklyTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range for `day`, replacing any previous one.
    pub fn set(mut self, day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        self.0[day.num_days_from_monday() as usize] = Some(TimeRange::new(start, end));
        self
    }

    pub fn get(&self, day: Weekday) -> Option<TimeRange> {
        self.0[day.num_days_from_monday() as usize]
    }

    /// Configured `(weekday, range)` pairs, Monday first.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, TimeRange)> + '_ {
        WEEK.iter()
            .zip(self.0.iter())
            .filter_map(|(day, range)| range.map(|r| (*day, r)))
    }
}

/// Recurrence of a rule together with its time-of-day bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "times", rename_all = "snake_case")]
pub enum Periodicity {
    /// A single window on `date_from`.
    Once(TimeRange),
    /// The same window on every date of the range.
    Daily(TimeRange),
    /// Per-weekday windows; days without a range contribute nothing.
    Weekly(WeeklyTimes),
}

/// A declarative availability rule owned by one ground-station channel.
///
/// Instances built through [`AvailabilityRule::new`] and the `once` / `daily` /
/// `weekly` shorthands are always validated; deserialized ones should be
/// checked with [`AvailabilityRule::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    id: Id,
    channel: Id,
    operation: Operation,
    periodicity: Periodicity,
    date_from: NaiveDate,
    date_to: NaiveDate,
}

impl AvailabilityRule {
    pub fn new(
        id: impl Into<Id>,
        channel: impl Into<Id>,
        operation: Operation,
        periodicity: Periodicity,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Self, RuleError> {
        let rule = Self {
            id: id.into(),
            channel: channel.into(),
            operation,
            periodicity,
            date_from,
            date_to,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// One-time window on `date`; the date range collapses to that day.
    pub fn once(
        id: impl Into<Id>,
        channel: impl Into<Id>,
        operation: Operation,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, RuleError> {
        let times = TimeRange::new(start, end);
        Self::new(id, channel, operation, Periodicity::Once(times), date, date)
    }

    pub fn daily(
        id: impl Into<Id>,
        channel: impl Into<Id>,
        operation: Operation,
        date_from: NaiveDate,
        date_to: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, RuleError> {
        let times = TimeRange::new(start, end);
        Self::new(id, channel, operation, Periodicity::Daily(times), date_from, date_to)
    }

    pub fn weekly(
        id: impl Into<Id>,
        channel: impl Into<Id>,
        operation: Operation,
        date_from: NaiveDate,
        date_to: NaiveDate,
        week: WeeklyTimes,
    ) -> Result<Self, RuleError> {
        Self::new(id, channel, operation, Periodicity::Weekly(week), date_from, date_to)
    }

    /// Checks the rule for internal consistency.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.date_to < self.date_from {
            return Err(RuleError::DateRangeInverted {
                from: self.date_from,
                to: self.date_to,
            });
        }
        match &self.periodicity {
            Periodicity::Once(range) | Periodicity::Daily(range) => range.validate(None),
            Periodicity::Weekly(week) => {
                let mut any = false;
                for (day, range) in week.days() {
                    range.validate(Some(day))?;
                    any = true;
                }
                if any {
                    Ok(())
                } else {
                    Err(RuleError::EmptyWeek)
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn periodicity(&self) -> &Periodicity {
        &self.periodicity
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    /// Time range this rule contributes on `date`, if any.
    pub fn applies_on(&self, date: NaiveDate) -> Option<TimeRange> {
        match &self.periodicity {
            Periodicity::Once(range) => (date == self.date_from).then_some(*range),
            Periodicity::Daily(range) => {
                (self.date_from <= date && date <= self.date_to).then_some(*range)
            }
            Periodicity::Weekly(week) => {
                if self.date_from <= date && date <= self.date_to {
                    week.get(date.weekday())
                } else {
                    None
                }
            }
        }
    }
}
