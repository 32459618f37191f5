//! slotbroker - Ground-station slot brokering
//!
//! Derives the availability of ground-station channels from ADD/REMOVE rules,
//! intersects it with predicted passes to offer operational slots, and runs
//! the select / confirm / deny / cancel protocol between spacecraft and
//! ground-station operators with poll-based change notification.

pub mod availability;
pub mod booking;
pub mod config;
pub mod engine;
pub mod intervals;
pub mod ports;
pub mod slots;
pub mod time;

pub use availability::{AvailabilityRule, AvailabilityTable, Operation, Periodicity, RuleError};
pub use booking::{BookingCoordinator, BookingError};
pub use config::EngineConfig;
pub use engine::{BookingEngine, EngineError, MaintenanceReport};
pub use intervals::{Interval, IntervalSet};
pub use slots::{OperationalSlot, Party, SlotGenerator, SlotId, SlotState};

/// Identifier type used for channels, segments and rules.
pub type Id = String;
