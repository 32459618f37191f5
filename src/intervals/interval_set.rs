//! A canonical container for non-overlapping, sorted intervals.
//!
//! [`IntervalSet`] wraps a `Vec<Interval<U>>` and guarantees the **canonical
//! invariant** at all times: intervals are sorted by start and no two intervals
//! overlap or touch (touching intervals are merged).
//!
//! Read access is transparent via `Deref<Target = [Interval<U>]>`. Mutation goes
//! through methods that re-establish the invariant.

use std::fmt::Display;
use std::ops::{Deref, Index};

use super::interval::Interval;
use super::operations;
use qtty::{Quantity, Unit};

/// A sorted, non-overlapping, non-touching set of half-open intervals.
///
/// # Performance
///
/// - Construction from unsorted input: O(n log n) sort + O(n) merge.
/// - `push`: O(1) when appending in order, O(n log n) otherwise.
/// - `subtract` / `intersection`: O(n + m) sweeps.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSet<U: Unit>(Vec<Interval<U>>);

// ─────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> IntervalSet<U> {
    /// Creates an empty interval set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps a `Vec` that is **already in canonical form** without re-sorting.
    ///
    /// In debug builds this asserts the invariant.
    pub fn from_sorted_unchecked(vec: Vec<Interval<U>>) -> Self {
        debug_assert!(
            operations::assertions::is_canonical(&vec),
            "IntervalSet::from_sorted_unchecked called with non-canonical input"
        );
        Self(vec)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Mutation methods
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> IntervalSet<U> {
    /// Inserts an interval, maintaining canonical form.
    pub fn push(&mut self, interval: Interval<U>) {
        if let Some(last) = self.0.last_mut() {
            if interval.start().value() > last.end().value() {
                self.0.push(interval);
                return;
            }
            if interval.start().value() >= last.start().value() {
                // Touching or overlapping the tail only.
                if interval.end().value() > last.end().value() {
                    *last = Interval::new(last.start(), interval.end());
                }
                return;
            }
        }

        self.0.push(interval);
        self.0 = operations::normalize(std::mem::take(&mut self.0));
    }

    /// Removes all intervals.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Consumes the set and returns the underlying `Vec`.
    pub fn into_inner(self) -> Vec<Interval<U>> {
        self.0
    }

    /// Returns a slice of the intervals.
    pub fn as_slice(&self) -> &[Interval<U>] {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────
// Set operations
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> IntervalSet<U> {
    /// Returns every point of `self` that is not covered by `negative`.
    pub fn subtract(&self, negative: &IntervalSet<U>) -> IntervalSet<U> {
        // Subtracting a canonical mask from a canonical set never creates
        // touching pieces: every gap introduced has positive width.
        Self::from_sorted_unchecked(operations::subtract(&self.0, &negative.0))
    }

    /// Returns the intersection of `self` and `other`.
    pub fn intersection(&self, other: &IntervalSet<U>) -> IntervalSet<U> {
        Self::from_sorted_unchecked(operations::compute_intersection(&self.0, &other.0))
    }

    /// Returns the parts of `self` that fall inside `range`.
    pub fn within(&self, range: Interval<U>) -> IntervalSet<U> {
        self.intersection(&IntervalSet::from(range))
    }

    /// Returns true if a single member interval covers all of `query`.
    pub fn covers(&self, query: &Interval<U>) -> bool {
        let idx = self
            .0
            .partition_point(|iv| iv.start().value() <= query.start().value());
        idx > 0 && self.0[idx - 1].covers(query)
    }

    /// Sum of the member durations.
    pub fn total_duration(&self) -> Quantity<U> {
        self.0
            .iter()
            .fold(Quantity::new(0.0), |acc, iv| acc + iv.duration())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Transparent read access
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> Deref for IntervalSet<U> {
    type Target = [Interval<U>];

    fn deref(&self) -> &[Interval<U>] {
        &self.0
    }
}

impl<U: Unit> AsRef<[Interval<U>]> for IntervalSet<U> {
    fn as_ref(&self) -> &[Interval<U>] {
        &self.0
    }
}

impl<U: Unit> Index<usize> for IntervalSet<U> {
    type Output = Interval<U>;

    fn index(&self, index: usize) -> &Interval<U> {
        &self.0[index]
    }
}

// ─────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> From<Vec<Interval<U>>> for IntervalSet<U> {
    /// Creates an `IntervalSet` from an unsorted `Vec`, normalizing on construction.
    fn from(vec: Vec<Interval<U>>) -> Self {
        Self(operations::normalize(vec))
    }
}

impl<U: Unit> From<Interval<U>> for IntervalSet<U> {
    fn from(interval: Interval<U>) -> Self {
        Self(vec![interval])
    }
}

impl<U: Unit> FromIterator<Interval<U>> for IntervalSet<U> {
    fn from_iter<I: IntoIterator<Item = Interval<U>>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<U: Unit> IntoIterator for IntervalSet<U> {
    type Item = Interval<U>;
    type IntoIter = std::vec::IntoIter<Interval<U>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, U: Unit> IntoIterator for &'a IntervalSet<U> {
    type Item = &'a Interval<U>;
    type IntoIter = std::slice::Iter<'a, Interval<U>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Trait impls
// ─────────────────────────────────────────────────────────────────────

impl<U: Unit> Default for IntervalSet<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Unit> Display for IntervalSet<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, interval) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", interval)?;
        }
        write!(f, "}}")
    }
}

/// Enables `assert_eq!(interval_set, vec![...])` in tests.
impl<U: Unit> PartialEq<Vec<Interval<U>>> for IntervalSet<U> {
    fn eq(&self, other: &Vec<Interval<U>>) -> bool {
        self.0 == *other
    }
}

impl<U: Unit> serde::Serialize for IntervalSet<U> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, U: Unit> serde::Deserialize<'de> for IntervalSet<U> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let vec = Vec::<Interval<U>>::deserialize(deserializer)?;
        Ok(Self::from(vec))
    }
}
