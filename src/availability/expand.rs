//! Expansion of availability rules into concrete windows over a horizon.

use chrono::NaiveDate;
use log::debug;
use qtty::Second;

use super::error::RuleError;
use super::rule::{AvailabilityRule, Operation, Periodicity, TimeRange};
use crate::intervals::{normalize, subtract, IntervalSet};
use crate::time::{self, TimeWindow};

/// Expands one rule into its raw windows, clipped to `horizon`.
///
/// The output is sorted by start; it is not normalized against other rules.
/// The rule is re-validated first so an inconsistent rule fails loudly
/// instead of producing a partial expansion.
pub fn expand(rule: &AvailabilityRule, horizon: TimeWindow) -> Result<Vec<TimeWindow>, RuleError> {
    rule.validate()?;

    let (Some(first), Some(last)) = (
        time::from_axis(horizon.start()),
        time::from_axis(horizon.end()),
    ) else {
        return Err(RuleError::HorizonOutOfRange(horizon.to_string()));
    };
    let (first, last) = (first.date_naive(), last.date_naive());

    let windows = match rule.periodicity() {
        Periodicity::Once(range) => clip(rule.date_from(), range, horizon).into_iter().collect(),
        Periodicity::Daily(_) | Periodicity::Weekly(_) => {
            let from = rule.date_from().max(first);
            let to = rule.date_to().min(last);
            let mut out = Vec::new();
            let mut day = Some(from);
            while let Some(date) = day.filter(|date| *date <= to) {
                if let Some(range) = rule.applies_on(date) {
                    out.extend(clip(date, &range, horizon));
                }
                day = date.succ_opt();
            }
            out
        }
    };

    debug!(
        "rule {} ({:?}) expanded to {} window(s) in {}",
        rule.id(),
        rule.operation(),
        windows.len(),
        time::describe(&horizon)
    );
    Ok(windows)
}

/// Computes a channel's availability: the union of every ADD rule minus the
/// union of every REMOVE rule, inside `horizon`.
pub fn expand_all(
    rules: &[AvailabilityRule],
    horizon: TimeWindow,
) -> Result<IntervalSet<Second>, RuleError> {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for rule in rules {
        let windows = expand(rule, horizon)?;
        match rule.operation() {
            Operation::Add => positive.extend(windows),
            Operation::Remove => negative.extend(windows),
        }
    }

    let positive = normalize(positive);
    let negative = normalize(negative);
    Ok(IntervalSet::from_sorted_unchecked(subtract(&positive, &negative)))
}

fn clip(date: NaiveDate, range: &TimeRange, horizon: TimeWindow) -> Option<TimeWindow> {
    let raw = TimeWindow::checked(time::at(date, range.start), time::at(date, range.end))?;
    raw.intersection(&horizon)
}
