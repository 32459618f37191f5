//! Candidate slots from availability ∩ visibility.

use std::collections::BTreeMap;

use log::{debug, warn};
use qtty::{Quantity, Second};

use super::slot::{OperationalSlot, SlotId};
use crate::availability::AvailabilityTable;
use crate::ports::{ChannelPair, VisibilityWindow};
use crate::time::TimeWindow;

/// Turns a ground-station channel's availability into candidate slots.
///
/// Generation is pure: it only computes the slots the current inputs imply.
/// Reconciling them against existing bookings is the coordinator's job.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    min_duration: Quantity<Second>,
}

impl SlotGenerator {
    /// Intersections shorter than `min_duration` are discarded.
    pub fn new(min_duration: Quantity<Second>) -> Self {
        Self { min_duration }
    }

    pub fn min_duration(&self) -> Quantity<Second> {
        self.min_duration
    }

    /// Candidate `Free` slots for every pair served by `table`'s channel.
    ///
    /// Pairs for other channels and windows for other segment pairs are
    /// ignored. The result is sorted by slot id and contains each id once.
    pub fn generate(
        &self,
        table: &AvailabilityTable,
        pairs: &[ChannelPair],
        windows: &[VisibilityWindow],
    ) -> Vec<OperationalSlot> {
        let mut slots: BTreeMap<SlotId, OperationalSlot> = BTreeMap::new();

        for pair in pairs
            .iter()
            .filter(|p| p.groundstation_channel == table.channel())
        {
            let mut visible: Vec<TimeWindow> = windows
                .iter()
                .filter(|w| {
                    w.spacecraft_id == pair.spacecraft_id
                        && w.groundstation_id == pair.groundstation_id
                })
                .map(|w| w.window)
                .collect();
            if !crate::intervals::operations::assertions::is_sorted_by_start(&visible) {
                warn!(
                    "visibility windows for {} -> {} arrived unsorted",
                    pair.spacecraft_id, pair.groundstation_id
                );
            }
            visible.sort_by(|a, b| a.start().value().total_cmp(&b.start().value()));

            for window in overlaps(&visible, table.intervals()) {
                if window.duration().value() < self.min_duration.value() {
                    continue;
                }
                let slot = OperationalSlot::new(pair.clone(), window);
                slots.entry(slot.id()).or_insert(slot);
            }
        }

        debug!(
            "generated {} candidate slot(s) for channel {}",
            slots.len(),
            table.channel()
        );
        slots.into_values().collect()
    }
}

/// Every non-empty `window ∩ interval`, for windows sorted by start and
/// canonical `intervals`.
///
/// `j` only moves past intervals that end before the current window starts;
/// since window starts never decrease, those intervals cannot meet any later
/// window either.
fn overlaps(windows: &[TimeWindow], intervals: &[TimeWindow]) -> Vec<TimeWindow> {
    let mut out = Vec::new();
    let mut j = 0usize;
    for window in windows {
        while j < intervals.len() && intervals[j].end().value() <= window.start().value() {
            j += 1;
        }
        out.extend(
            intervals[j..]
                .iter()
                .take_while(|iv| iv.start().value() < window.end().value())
                .filter_map(|iv| iv.intersection(window)),
        );
    }
    out
}
