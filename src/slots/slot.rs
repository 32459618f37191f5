//! Operational slots: the unit of booking.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::ChannelPair;
use crate::time::{self, TimeWindow};
use crate::Id;

/// Namespace for slot identifiers (UUID v5).
const SLOT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d0e_8a26_51c9_e3f0_7b12);

/// Stable identifier of an operational slot.
///
/// Derived from the ground-station channel, the spacecraft channel and the
/// window bounds, so regenerating the same slot yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(Uuid);

impl SlotId {
    pub fn derive(pair: &ChannelPair, window: &TimeWindow) -> Self {
        let name = format!(
            "{}|{}|{}|{}",
            pair.groundstation_channel,
            pair.spacecraft_channel,
            window.start().value(),
            window.end().value()
        );
        Self(Uuid::new_v5(&SLOT_NAMESPACE, name.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SlotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Booking state of a slot.
///
/// `Free → Selected → Reserved` is the happy path. `Denied` and `Canceled`
/// are transient: they last until the spacecraft side has read the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    Free,
    Selected,
    Reserved,
    Denied,
    Canceled,
}

impl SlotState {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Denied | Self::Canceled)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "FREE"),
            Self::Selected => write!(f, "SELECTED"),
            Self::Reserved => write!(f, "RESERVED"),
            Self::Denied => write!(f, "DENIED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Identity calling into the booking protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Party {
    Spacecraft(Id),
    GroundStation(Id),
}

impl Party {
    pub fn id(&self) -> &str {
        match self {
            Self::Spacecraft(id) | Self::GroundStation(id) => id,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spacecraft(id) => write!(f, "spacecraft {}", id),
            Self::GroundStation(id) => write!(f, "ground station {}", id),
        }
    }
}

/// A bookable window between one spacecraft channel and one ground-station
/// channel.
///
/// `gs_pending` is set when the spacecraft side changed the slot and the
/// ground station has not looked yet; `sc_pending` is the mirror image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalSlot {
    id: SlotId,
    window: TimeWindow,
    pair: ChannelPair,
    state: SlotState,
    gs_pending: bool,
    sc_pending: bool,
}

impl OperationalSlot {
    /// A fresh `Free` slot with no pending notifications.
    pub fn new(pair: ChannelPair, window: TimeWindow) -> Self {
        Self {
            id: SlotId::derive(&pair, &window),
            window,
            pair,
            state: SlotState::Free,
            gs_pending: false,
            sc_pending: false,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Start as a UTC instant; `None` if the window lies outside the
    /// calendar range.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        time::from_axis(self.window.start())
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        time::from_axis(self.window.end())
    }

    pub fn pair(&self) -> &ChannelPair {
        &self.pair
    }

    pub fn spacecraft_channel(&self) -> &str {
        &self.pair.spacecraft_channel
    }

    pub fn groundstation_channel(&self) -> &str {
        &self.pair.groundstation_channel
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn gs_pending(&self) -> bool {
        self.gs_pending
    }

    pub fn sc_pending(&self) -> bool {
        self.sc_pending
    }

    /// True if `party` owns one side of this slot.
    pub fn is_relevant_to(&self, party: &Party) -> bool {
        match party {
            Party::Spacecraft(id) => self.pair.spacecraft_id == *id,
            Party::GroundStation(id) => self.pair.groundstation_id == *id,
        }
    }

    /// The pending flag that `party` consumes.
    pub fn pending_for(&self, party: &Party) -> bool {
        match party {
            Party::Spacecraft(_) => self.sc_pending,
            Party::GroundStation(_) => self.gs_pending,
        }
    }

    pub(crate) fn set_state(&mut self, state: SlotState) {
        self.state = state;
    }

    pub(crate) fn set_gs_pending(&mut self, pending: bool) {
        self.gs_pending = pending;
    }

    pub(crate) fn set_sc_pending(&mut self, pending: bool) {
        self.sc_pending = pending;
    }

    pub(crate) fn clear_pending_for(&mut self, party: &Party) {
        match party {
            Party::Spacecraft(_) => self.sc_pending = false,
            Party::GroundStation(_) => self.gs_pending = false,
        }
    }
}
