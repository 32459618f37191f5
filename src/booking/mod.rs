//! The booking protocol between spacecraft and ground-station operators.
//!
//! Slots move `Free → Selected → Reserved` (or `Denied`, then back to
//! `Free`), and `Reserved → Canceled → Free`. Each transition raises a
//! pending flag for the counter-party, which reads it with
//! [`BookingCoordinator::get_changes`]. Nothing is pushed.

mod coordinator;
mod error;
mod registry;
mod transition;

pub use coordinator::{BookingCoordinator, ReconcileOutcome};
pub use error::BookingError;
pub use registry::SlotRegistry;
pub use transition::Transition;
