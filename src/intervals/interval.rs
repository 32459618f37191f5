//! Half-open interval on a scheduling axis.

use std::fmt::Display;

use qtty::{Quantity, Unit};

/// Half-open range `[start, end)` on a time axis.
///
/// Two intervals that merely touch (`a.end == b.start`) share no point and
/// therefore do not overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<U: Unit> {
    start: Quantity<U>,
    end: Quantity<U>,
}

impl<U: Unit> Interval<U> {
    /// Creates interval `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `start >= end`.
    pub const fn new(start: Quantity<U>, end: Quantity<U>) -> Self {
        assert!(start.value() < end.value(), "Interval start must be < end");
        Self { start, end }
    }

    /// Creates `[start, end)` if it is non-empty.
    pub fn checked(start: Quantity<U>, end: Quantity<U>) -> Option<Self> {
        (start.value() < end.value()).then_some(Self { start, end })
    }

    pub const fn from_f64(start: f64, end: f64) -> Self {
        Self::new(Quantity::<U>::new(start), Quantity::<U>::new(end))
    }

    pub const fn start(&self) -> Quantity<U> {
        self.start
    }

    pub const fn end(&self) -> Quantity<U> {
        self.end
    }

    pub fn duration(&self) -> Quantity<U> {
        self.end - self.start
    }

    /// Returns true if `position` ∈ `[start, end)`.
    pub const fn contains(&self, position: Quantity<U>) -> bool {
        self.start.value() <= position.value() && position.value() < self.end.value()
    }

    /// Returns true if `other` lies entirely inside this interval.
    pub const fn covers(&self, other: &Interval<U>) -> bool {
        self.start.value() <= other.start.value() && other.end.value() <= self.end.value()
    }

    /// Checks if the two intervals share at least one point.
    pub const fn overlaps(&self, other: &Interval<U>) -> bool {
        self.start.value() < other.end.value() && other.start.value() < self.end.value()
    }

    /// Returns true if one interval ends exactly where the other starts.
    pub const fn touches(&self, other: &Interval<U>) -> bool {
        self.end.value() == other.start.value() || other.end.value() == self.start.value()
    }

    pub fn intersection(&self, other: &Interval<U>) -> Option<Interval<U>> {
        if !self.overlaps(other) {
            return None;
        }
        let start = crate::intervals::quantity_max(self.start, other.start);
        let end = crate::intervals::quantity_min(self.end, other.end);
        Some(Interval::new(start, end))
    }
}

impl<U: Unit> Display for Interval<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.start.value(), self.end.value())
    }
}

// =============================================================================
// Interval Serde Support
// =============================================================================

impl<U: Unit> serde::Serialize for Interval<U> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Interval", 2)?;
        s.serialize_field("start", &self.start.value())?;
        s.serialize_field("end", &self.end.value())?;
        s.end()
    }
}

impl<'de, U: Unit> serde::Deserialize<'de> for Interval<U> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw {
            start: f64,
            end: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::checked(Quantity::<U>::new(raw.start), Quantity::<U>::new(raw.end)).ok_or_else(
            || serde::de::Error::custom("interval start must be strictly before its end"),
        )
    }
}
