//! Interval algebra over half-open time intervals.
//!
//! Pure functions only: [`normalize`] merges overlapping or touching intervals
//! into a canonical sequence, [`subtract`] removes a mask from a sequence and
//! [`compute_intersection`] overlaps two canonical sequences. [`IntervalSet`]
//! packages the canonical form as a type.

mod interval;
mod interval_set;
pub mod operations;

pub use interval::Interval;
pub use interval_set::IntervalSet;
pub use operations::{compute_intersection, normalize, subtract};

use qtty::{Quantity, Unit};

/// Returns the minimum of two quantities.
pub fn quantity_min<U: Unit>(a: Quantity<U>, b: Quantity<U>) -> Quantity<U> {
    match a.value().partial_cmp(&b.value()) {
        Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal) => a,
        _ => b,
    }
}

/// Returns the maximum of two quantities.
pub fn quantity_max<U: Unit>(a: Quantity<U>, b: Quantity<U>) -> Quantity<U> {
    match a.value().partial_cmp(&b.value()) {
        Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal) => a,
        _ => b,
    }
}
