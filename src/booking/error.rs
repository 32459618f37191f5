use thiserror::Error;

use crate::slots::{Party, SlotId, SlotState};

/// Rejections raised by the booking protocol.
///
/// `InvalidState`, `NotOwner` and `UnknownSlot` all mean the request does not
/// apply to the current slot state and are never retried automatically.
/// `NoChanges` is routine: the caller polls again later.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Slot {slot} is {actual}, operation requires {expected}")]
    InvalidState {
        slot: SlotId,
        expected: SlotState,
        actual: SlotState,
    },

    #[error("Slot {slot} does not belong to {party}")]
    NotOwner { slot: SlotId, party: Party },

    #[error("Slot {0} does not exist")]
    UnknownSlot(SlotId),

    #[error("No pending changes for {0}")]
    NoChanges(Party),
}

impl BookingError {
    /// True for every rejection of a booking request against slot state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::NotOwner { .. } | Self::UnknownSlot(_)
        )
    }

    pub fn is_no_changes(&self) -> bool {
        matches!(self, Self::NoChanges(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ChannelPair;
    use crate::time::TimeWindow;

    fn id() -> SlotId {
        SlotId::derive(
            &ChannelPair::new("sc", "sc-ch", "gs", "gs-ch"),
            &TimeWindow::from_f64(0.0, 60.0),
        )
    }

    #[test]
    fn invalid_state_display() {
        let e = BookingError::InvalidState {
            slot: id(),
            expected: SlotState::Free,
            actual: SlotState::Reserved,
        };
        assert_eq!(
            e.to_string(),
            format!("Slot {} is RESERVED, operation requires FREE", id())
        );
        assert!(e.is_invalid_state());
        assert!(!e.is_no_changes());
    }

    #[test]
    fn no_changes_display() {
        let e = BookingError::NoChanges(Party::GroundStation("gs-1".into()));
        assert_eq!(e.to_string(), "No pending changes for ground station gs-1");
        assert!(e.is_no_changes());
        assert!(!e.is_invalid_state());
    }

    #[test]
    fn ownership_and_unknown_are_invalid_state() {
        let not_owner = BookingError::NotOwner {
            slot: id(),
            party: Party::Spacecraft("sc-2".into()),
        };
        assert!(not_owner.is_invalid_state());
        assert!(BookingError::UnknownSlot(id()).is_invalid_state());
    }
}
