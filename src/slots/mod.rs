//! Operational slots and their generation.

mod generator;
mod slot;

pub use generator::SlotGenerator;
pub use slot::{OperationalSlot, Party, SlotId, SlotState};
