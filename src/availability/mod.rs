//! Ground-station availability: rules, their expansion and the per-channel table.
//!
//! A channel's availability is derived, never stored by hand: every ADD rule
//! is expanded and normalized into a positive set, every REMOVE rule into a
//! negative set, and the table holds `positive − negative` over the horizon.

pub mod error;
pub mod expand;
pub mod rule;
pub mod table;

pub use error::RuleError;
pub use expand::{expand, expand_all};
pub use rule::{AvailabilityRule, Operation, Periodicity, TimeRange, WeeklyTimes};
pub use table::{AvailabilityTable, TableDiff};
