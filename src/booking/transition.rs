//! The slot state machine.
//!
//! | Transition | Caller         | From       | To         | Sets         | Clears       |
//! |------------|----------------|------------|------------|--------------|--------------|
//! | `Select`   | spacecraft     | `Free`     | `Selected` | `gs_pending` |              |
//! | `Confirm`  | ground station | `Selected` | `Reserved` | `sc_pending` | `gs_pending` |
//! | `Deny`     | ground station | `Selected` | `Denied`   | `sc_pending` | `gs_pending` |
//! | `Cancel`   | ground station | `Reserved` | `Canceled` | `sc_pending` |              |
//!
//! `Denied` and `Canceled` fall back to `Free` once both flags are clear; that
//! step belongs to change retrieval, not to this table.

use super::error::BookingError;
use crate::slots::{OperationalSlot, Party, SlotState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Select,
    Confirm,
    Deny,
    Cancel,
}

impl Transition {
    pub fn source(self) -> SlotState {
        match self {
            Self::Select => SlotState::Free,
            Self::Confirm | Self::Deny => SlotState::Selected,
            Self::Cancel => SlotState::Reserved,
        }
    }

    pub fn target(self) -> SlotState {
        match self {
            Self::Select => SlotState::Selected,
            Self::Confirm => SlotState::Reserved,
            Self::Deny => SlotState::Denied,
            Self::Cancel => SlotState::Canceled,
        }
    }

    /// Builds the caller identity this transition is performed as.
    pub fn caller(self, id: &str) -> Party {
        match self {
            Self::Select => Party::Spacecraft(id.to_string()),
            Self::Confirm | Self::Deny | Self::Cancel => Party::GroundStation(id.to_string()),
        }
    }

    /// Checks ownership and source state without touching the slot.
    pub fn check(self, slot: &OperationalSlot, caller: &Party) -> Result<(), BookingError> {
        if !slot.is_relevant_to(caller) {
            return Err(BookingError::NotOwner {
                slot: slot.id(),
                party: caller.clone(),
            });
        }
        if slot.state() != self.source() {
            return Err(BookingError::InvalidState {
                slot: slot.id(),
                expected: self.source(),
                actual: slot.state(),
            });
        }
        Ok(())
    }

    /// Moves `slot` to the target state and raises the counter-party's flag.
    ///
    /// Callers must have run [`Transition::check`] under the same lock.
    pub(crate) fn apply(self, slot: &mut OperationalSlot) {
        debug_assert_eq!(slot.state(), self.source());
        slot.set_state(self.target());
        match self {
            Self::Select => slot.set_gs_pending(true),
            Self::Confirm | Self::Deny => {
                slot.set_sc_pending(true);
                slot.set_gs_pending(false);
            }
            Self::Cancel => slot.set_sc_pending(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ChannelPair;
    use crate::time::TimeWindow;

    fn slot() -> OperationalSlot {
        OperationalSlot::new(
            ChannelPair::new("sc-1", "sc-ch", "gs-1", "gs-ch"),
            TimeWindow::from_f64(0.0, 600.0),
        )
    }

    #[test]
    fn happy_path_flags() {
        let mut s = slot();
        let sc = Transition::Select.caller("sc-1");
        let gs = Transition::Confirm.caller("gs-1");

        Transition::Select.check(&s, &sc).unwrap();
        Transition::Select.apply(&mut s);
        assert_eq!(s.state(), SlotState::Selected);
        assert!(s.gs_pending());
        assert!(!s.sc_pending());

        Transition::Confirm.check(&s, &gs).unwrap();
        Transition::Confirm.apply(&mut s);
        assert_eq!(s.state(), SlotState::Reserved);
        assert!(!s.gs_pending());
        assert!(s.sc_pending());
    }

    #[test]
    fn wrong_source_state_is_rejected() {
        let s = slot();
        let err = Transition::Confirm
            .check(&s, &Transition::Confirm.caller("gs-1"))
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidState {
                slot: s.id(),
                expected: SlotState::Selected,
                actual: SlotState::Free,
            }
        );
    }

    #[test]
    fn foreign_caller_is_rejected() {
        let s = slot();
        let err = Transition::Select
            .check(&s, &Transition::Select.caller("sc-2"))
            .unwrap_err();
        assert!(matches!(err, BookingError::NotOwner { .. }));
    }

    #[test]
    fn cancel_keeps_ground_station_flag() {
        let mut s = slot();
        Transition::Select.apply(&mut s);
        Transition::Confirm.apply(&mut s);
        Transition::Cancel.apply(&mut s);
        assert_eq!(s.state(), SlotState::Canceled);
        assert!(s.sc_pending());
        assert!(!s.gs_pending());
    }
}
