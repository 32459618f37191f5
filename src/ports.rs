//! Contracts the engine expects from its external collaborators.
//!
//! Persistence of channels and rules, compatibility decisions and orbital pass
//! prediction all live outside this crate. The engine only sees them through
//! these traits, so tests and embedders plug in whatever backs them.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityRule;
use crate::time::TimeWindow;
use crate::Id;

/// A spacecraft channel allowed to use a ground-station channel, with the
/// identities that own each side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelPair {
    pub spacecraft_id: Id,
    pub spacecraft_channel: Id,
    pub groundstation_id: Id,
    pub groundstation_channel: Id,
}

impl ChannelPair {
    pub fn new(
        spacecraft_id: impl Into<Id>,
        spacecraft_channel: impl Into<Id>,
        groundstation_id: impl Into<Id>,
        groundstation_channel: impl Into<Id>,
    ) -> Self {
        Self {
            spacecraft_id: spacecraft_id.into(),
            spacecraft_channel: spacecraft_channel.into(),
            groundstation_id: groundstation_id.into(),
            groundstation_channel: groundstation_channel.into(),
        }
    }
}

/// Interval during which a spacecraft is observable from a ground station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityWindow {
    pub spacecraft_id: Id,
    pub groundstation_id: Id,
    pub window: TimeWindow,
}

impl VisibilityWindow {
    pub fn new(
        spacecraft_id: impl Into<Id>,
        groundstation_id: impl Into<Id>,
        window: TimeWindow,
    ) -> Self {
        Self {
            spacecraft_id: spacecraft_id.into(),
            groundstation_id: groundstation_id.into(),
            window,
        }
    }
}

/// Failure reported by a collaborator; carried through as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PortError(pub String);

/// Source of channel compatibility and availability rules.
pub trait ConfigurationStore: Send + Sync + Debug {
    /// Every rule currently attached to `groundstation_channel`.
    fn rules(&self, groundstation_channel: &str) -> Result<Vec<AvailabilityRule>, PortError>;

    /// Every `(spacecraft channel, ground-station channel)` pair that may communicate.
    fn compatible_pairs(&self) -> Result<Vec<ChannelPair>, PortError>;
}

/// Orbital pass prediction.
pub trait PassPredictor: Send + Sync + Debug {
    /// Visibility windows of `spacecraft_id` from `groundstation_id` inside
    /// `horizon`, sorted by start and non-overlapping.
    fn visibility_windows(
        &self,
        spacecraft_id: &str,
        groundstation_id: &str,
        horizon: TimeWindow,
    ) -> Result<Vec<VisibilityWindow>, PortError>;
}
