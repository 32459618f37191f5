//! Materialized availability of one ground-station channel.

use log::{debug, info};
use qtty::Second;
use serde::{Deserialize, Serialize};

use super::error::RuleError;
use super::expand::expand_all;
use super::rule::AvailabilityRule;
use crate::intervals::IntervalSet;
use crate::time::{self, TimeWindow};
use crate::Id;

/// What changed between two successive recomputations of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDiff {
    /// Windows present now that were absent before.
    pub added: Vec<TimeWindow>,
    /// Windows that were present before and are gone now.
    pub removed: Vec<TimeWindow>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Normalized available windows of a ground-station channel.
///
/// The table is recomputed from the full rule set on every change, never
/// patched incrementally. Diffing uses exact window equality: a window kept
/// byte-for-byte keeps every slot derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityTable {
    channel: Id,
    intervals: IntervalSet<Second>,
}

impl AvailabilityTable {
    pub fn new(channel: impl Into<Id>) -> Self {
        Self {
            channel: channel.into(),
            intervals: IntervalSet::new(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current normalized windows, sorted by start.
    pub fn intervals(&self) -> &IntervalSet<Second> {
        &self.intervals
    }

    /// True if one available window covers all of `window`.
    pub fn covers(&self, window: &TimeWindow) -> bool {
        self.intervals.covers(window)
    }

    /// Available time inside `range`.
    pub fn available_within(&self, range: TimeWindow) -> IntervalSet<Second> {
        self.intervals.within(range)
    }

    /// Rebuilds the table from `rules` over `horizon` and reports the diff.
    ///
    /// Every rule must belong to this table's channel. On error the table is
    /// left unchanged.
    pub fn recompute(
        &mut self,
        rules: &[AvailabilityRule],
        horizon: TimeWindow,
    ) -> Result<TableDiff, RuleError> {
        if let Some(foreign) = rules.iter().find(|r| r.channel() != self.channel) {
            return Err(RuleError::ForeignChannel {
                rule: foreign.id().to_string(),
                rule_channel: foreign.channel().to_string(),
                table_channel: self.channel.clone(),
            });
        }

        let fresh = expand_all(rules, horizon)?;
        let diff = diff_sorted(&self.intervals, &fresh);

        info!(
            "availability of channel {} recomputed over {}: {} window(s), +{} -{}",
            self.channel,
            time::describe(&horizon),
            fresh.len(),
            diff.added.len(),
            diff.removed.len()
        );
        for window in &diff.removed {
            debug!("channel {} lost window {}", self.channel, time::describe(window));
        }

        self.intervals = fresh;
        Ok(diff)
    }
}

/// Exact-equality diff of two sorted sequences, in one merge walk.
fn diff_sorted(old: &[TimeWindow], new: &[TimeWindow]) -> TableDiff {
    use std::cmp::Ordering;

    let key = |w: &TimeWindow| (w.start().value(), w.end().value());
    let mut diff = TableDiff::default();
    let (mut i, mut j) = (0usize, 0usize);

    while i < old.len() && j < new.len() {
        let (a, b) = (key(&old[i]), key(&new[j]));
        let order = a
            .0
            .total_cmp(&b.0)
            .then_with(|| a.1.total_cmp(&b.1));
        match order {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                diff.removed.push(old[i]);
                i += 1;
            }
            Ordering::Greater => {
                diff.added.push(new[j]);
                j += 1;
            }
        }
    }
    diff.removed.extend_from_slice(&old[i..]);
    diff.added.extend_from_slice(&new[j..]);
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::rule::Operation;
    use chrono::{NaiveDate, NaiveTime};

    const H: f64 = 3600.0;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn at(day: u32, h: f64) -> f64 {
        time::at(d(day), t(0)).value() + h * H
    }

    fn horizon() -> TimeWindow {
        TimeWindow::from_f64(at(1, 0.0), at(8, 0.0))
    }

    fn daily(
        id: &str,
        op: Operation,
        from: u32,
        to: u32,
        start: u32,
        end: u32,
    ) -> AvailabilityRule {
        AvailabilityRule::daily(id, "gs-1", op, d(from), d(to), t(start), t(end)).unwrap()
    }

    #[test]
    fn first_recompute_reports_everything_added() {
        let mut table = AvailabilityTable::new("gs-1");
        let diff = table
            .recompute(&[daily("a", Operation::Add, 1, 2, 8, 10)], horizon())
            .unwrap();
        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());
        assert_eq!(table.intervals().len(), 2);
    }

    #[test]
    fn unchanged_windows_are_not_reported() {
        let mut table = AvailabilityTable::new("gs-1");
        let rules = vec![daily("a", Operation::Add, 1, 3, 8, 10)];
        table.recompute(&rules, horizon()).unwrap();
        let diff = table.recompute(&rules, horizon()).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn removal_rule_reports_replaced_windows() {
        let mut table = AvailabilityTable::new("gs-1");
        let add = daily("a", Operation::Add, 1, 2, 8, 12);
        table.recompute(&[add.clone()], horizon()).unwrap();

        let remove = daily("r", Operation::Remove, 2, 2, 9, 10);
        let diff = table.recompute(&[add, remove], horizon()).unwrap();

        assert_eq!(diff.removed, vec![TimeWindow::from_f64(at(2, 8.0), at(2, 12.0))]);
        assert_eq!(
            diff.added,
            vec![
                TimeWindow::from_f64(at(2, 8.0), at(2, 9.0)),
                TimeWindow::from_f64(at(2, 10.0), at(2, 12.0)),
            ]
        );
        // Day 1 untouched.
        assert!(table.covers(&TimeWindow::from_f64(at(1, 8.0), at(1, 12.0))));
    }

    #[test]
    fn deleting_every_rule_removes_everything() {
        let mut table = AvailabilityTable::new("gs-1");
        table
            .recompute(&[daily("a", Operation::Add, 1, 3, 8, 10)], horizon())
            .unwrap();
        let diff = table.recompute(&[], horizon()).unwrap();
        assert_eq!(diff.removed.len(), 3);
        assert!(table.intervals().is_empty());
    }

    #[test]
    fn foreign_rule_is_rejected_and_table_kept() {
        let mut table = AvailabilityTable::new("gs-1");
        table
            .recompute(&[daily("a", Operation::Add, 1, 1, 8, 10)], horizon())
            .unwrap();
        let foreign =
            AvailabilityRule::daily("x", "gs-2", Operation::Add, d(1), d(1), t(1), t(2)).unwrap();
        let err = table.recompute(&[foreign], horizon()).unwrap_err();
        assert!(matches!(err, RuleError::ForeignChannel { .. }));
        assert_eq!(table.intervals().len(), 1);
    }

    #[test]
    fn available_within_clips() {
        let mut table = AvailabilityTable::new("gs-1");
        table
            .recompute(&[daily("a", Operation::Add, 1, 2, 8, 10)], horizon())
            .unwrap();
        let within = table.available_within(TimeWindow::from_f64(at(1, 9.0), at(2, 0.0)));
        assert_eq!(within, vec![TimeWindow::from_f64(at(1, 9.0), at(1, 10.0))]);
    }
}
