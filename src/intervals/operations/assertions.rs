//! Debug-only shape checks for interval sequences.

use crate::intervals::Interval;
use qtty::Unit;

/// Returns true if `intervals` is canonical: sorted by start, pairwise disjoint
/// and with no two intervals touching (previous end < next start).
pub fn is_canonical<U: Unit>(intervals: &[Interval<U>]) -> bool {
    intervals
        .windows(2)
        .all(|w| w[0].end().value() < w[1].start().value())
}

/// Returns true if `intervals` is sorted by start (overlaps allowed).
pub fn is_sorted_by_start<U: Unit>(intervals: &[Interval<U>]) -> bool {
    intervals
        .windows(2)
        .all(|w| w[0].start().value() <= w[1].start().value())
}
