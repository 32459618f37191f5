use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use super::error::BookingError;
use super::registry::SlotRegistry;
use super::transition::Transition;
use crate::slots::{OperationalSlot, Party, SlotId, SlotState};
use crate::Id;

/// What a [`BookingCoordinator::reconcile`] pass changed in one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Candidates that were not present before, now `Free`.
    pub created: Vec<SlotId>,
    /// `Free` slots no longer backed by availability and visibility.
    pub withdrawn: Vec<SlotId>,
    /// Candidates already present; their state was left alone.
    pub kept: usize,
    /// Slots in a booked or transient state that the candidates no longer
    /// cover. They stay until their owners resolve them, and are withdrawn
    /// when they fall back to `Free`.
    pub orphaned: usize,
}

/// Owns every operational slot and runs the booking protocol on them.
///
/// Each call is atomic: a multi-slot request locks every affected
/// partition, validates every slot, then applies the transition to all of
/// them or returns the first rejection and changes nothing. Duplicate ids in
/// a request are treated as one.
#[derive(Debug, Default)]
pub struct BookingCoordinator {
    registry: SlotRegistry,
}

impl BookingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SlotRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// Spacecraft operator selects `ids`: `Free → Selected`.
    pub fn select(
        &self,
        spacecraft_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.transition(Transition::Select, spacecraft_id, ids)
    }

    /// Ground-station operator approves `ids`: `Selected → Reserved`.
    pub fn confirm(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.transition(Transition::Confirm, groundstation_id, ids)
    }

    /// Ground-station operator rejects `ids`: `Selected → Denied`.
    pub fn deny(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.transition(Transition::Deny, groundstation_id, ids)
    }

    /// Ground-station operator withdraws a reservation: `Reserved → Canceled`.
    pub fn cancel(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.transition(Transition::Cancel, groundstation_id, ids)
    }

    fn transition(
        &self,
        transition: Transition,
        caller_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        let caller = transition.caller(caller_id);
        let wanted: BTreeSet<SlotId> = ids.iter().copied().collect();
        let Some(&first) = wanted.iter().next() else {
            return Ok(Vec::new());
        };

        let mut grouped: BTreeMap<Id, Vec<SlotId>> = BTreeMap::new();
        for id in &wanted {
            let channel = self
                .registry
                .locate(id)
                .ok_or(BookingError::UnknownSlot(*id))?;
            grouped.entry(channel).or_default().push(*id);
        }

        // Keys of `grouped` are sorted, so the handles come back in lock order.
        let handles = self
            .registry
            .partitions_for(grouped.keys())
            .ok_or(BookingError::UnknownSlot(first))?;
        let mut guards: Vec<_> = handles.iter().map(|h| h.lock()).collect();

        for (slot_ids, guard) in grouped.values().zip(guards.iter()) {
            for id in slot_ids {
                let slot = guard
                    .slots
                    .get(id)
                    .ok_or(BookingError::UnknownSlot(*id))?;
                transition.check(slot, &caller)?;
            }
        }

        let mut changed = Vec::with_capacity(wanted.len());
        for (slot_ids, guard) in grouped.values().zip(guards.iter_mut()) {
            for id in slot_ids {
                if let Some(slot) = guard.slots.get_mut(id) {
                    transition.apply(slot);
                    changed.push(slot.clone());
                }
            }
        }
        drop(guards);

        debug!(
            "{} moved {} slot(s) {} -> {}",
            caller,
            changed.len(),
            transition.source(),
            transition.target()
        );
        sort_by_start(&mut changed);
        Ok(changed)
    }

    /// Slots relevant to `party` whose pending flag for `party` is set.
    ///
    /// Clears the flag on each returned slot. A `Denied` or `Canceled` slot
    /// whose other flag is also clear goes back to `Free`, or is withdrawn if
    /// availability no longer covers it. The returned snapshots show the
    /// state the party is being told about, not the reset.
    pub fn get_changes(&self, party: &Party) -> Result<Vec<OperationalSlot>, BookingError> {
        let mut changes = Vec::new();
        let mut released = 0usize;
        let mut withdrawn = 0usize;

        for (channel, handle) in self.registry.partitions() {
            let mut guard = handle.lock();
            let partition = &mut *guard;
            let mut dropped = Vec::new();
            for slot in partition.slots.values_mut() {
                if !slot.is_relevant_to(party) || !slot.pending_for(party) {
                    continue;
                }
                slot.clear_pending_for(party);
                changes.push(slot.clone());
                if slot.state().is_transient() && !slot.gs_pending() && !slot.sc_pending() {
                    if partition.orphans.remove(&slot.id()) {
                        dropped.push(slot.id());
                    } else {
                        slot.set_state(SlotState::Free);
                        released += 1;
                    }
                }
            }
            if !dropped.is_empty() {
                for id in &dropped {
                    partition.slots.remove(id);
                    debug!("channel {}: withdrew released orphan slot {}", channel, id);
                }
                self.registry.reindex(&channel, &[], &dropped);
                withdrawn += dropped.len();
            }
        }

        if changes.is_empty() {
            return Err(BookingError::NoChanges(party.clone()));
        }
        debug!(
            "{} read {} change(s), {} slot(s) released, {} withdrawn",
            party,
            changes.len(),
            released,
            withdrawn
        );
        sort_by_start(&mut changes);
        Ok(changes)
    }

    /// Replaces the `Free` slots of `groundstation_channel` with `candidates`.
    ///
    /// Candidates already present keep their current state and flags. `Free`
    /// slots missing from `candidates` are removed. Slots in any other state
    /// are never removed here; they are marked orphaned and withdrawn by
    /// [`BookingCoordinator::get_changes`] once released. Candidates for
    /// another channel are skipped.
    pub fn reconcile(
        &self,
        groundstation_channel: &str,
        candidates: Vec<OperationalSlot>,
    ) -> ReconcileOutcome {
        let mut fresh: BTreeMap<SlotId, OperationalSlot> = BTreeMap::new();
        for slot in candidates {
            if slot.groundstation_channel() != groundstation_channel {
                warn!(
                    "skipping slot {} for channel {} while reconciling {}",
                    slot.id(),
                    slot.groundstation_channel(),
                    groundstation_channel
                );
                continue;
            }
            fresh.entry(slot.id()).or_insert(slot);
        }

        let handle = self.registry.partition_or_create(groundstation_channel);
        let mut guard = handle.lock();
        let partition = &mut *guard;
        let mut outcome = ReconcileOutcome::default();

        partition.orphans.clear();
        for (id, slot) in &partition.slots {
            if fresh.contains_key(id) {
                continue;
            }
            if slot.state() == SlotState::Free {
                outcome.withdrawn.push(*id);
            } else {
                partition.orphans.insert(*id);
            }
        }
        outcome.orphaned = partition.orphans.len();
        for id in &outcome.withdrawn {
            partition.slots.remove(id);
            debug!("channel {}: withdrew free slot {}", groundstation_channel, id);
        }

        for (id, slot) in fresh {
            if partition.slots.contains_key(&id) {
                outcome.kept += 1;
            } else {
                partition.slots.insert(id, slot);
                outcome.created.push(id);
            }
        }

        self.registry
            .reindex(groundstation_channel, &outcome.created, &outcome.withdrawn);
        drop(guard);

        if outcome.orphaned > 0 {
            warn!(
                "channel {}: {} booked slot(s) no longer backed by availability",
                groundstation_channel, outcome.orphaned
            );
        }
        info!(
            "channel {}: {} slot(s) created, {} withdrawn, {} kept",
            groundstation_channel,
            outcome.created.len(),
            outcome.withdrawn.len(),
            outcome.kept
        );
        outcome
    }

    pub fn slot(&self, id: &SlotId) -> Option<OperationalSlot> {
        let channel = self.registry.locate(id)?;
        let handle = self.registry.partition(&channel)?;
        let guard = handle.lock();
        guard.slots.get(id).cloned()
    }

    /// Every slot one side of which belongs to `party`, sorted by start.
    pub fn slots_for(&self, party: &Party) -> Vec<OperationalSlot> {
        self.collect(|slot| slot.is_relevant_to(party))
    }

    /// Every slot currently in `state`, sorted by start.
    pub fn slots_in_state(&self, state: SlotState) -> Vec<OperationalSlot> {
        self.collect(|slot| slot.state() == state)
    }

    /// Every slot of one ground-station channel, sorted by start.
    pub fn slots_on_channel(&self, groundstation_channel: &str) -> Vec<OperationalSlot> {
        let Some(handle) = self.registry.partition(groundstation_channel) else {
            return Vec::new();
        };
        let mut slots: Vec<OperationalSlot> = handle.lock().slots.values().cloned().collect();
        sort_by_start(&mut slots);
        slots
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn collect(&self, keep: impl Fn(&OperationalSlot) -> bool) -> Vec<OperationalSlot> {
        let mut out = Vec::new();
        for (_, handle) in self.registry.partitions() {
            let guard = handle.lock();
            out.extend(guard.slots.values().filter(|s| keep(s)).cloned());
        }
        sort_by_start(&mut out);
        out
    }
}

fn sort_by_start(slots: &mut [OperationalSlot]) {
    slots.sort_by(|a, b| {
        a.window()
            .start()
            .value()
            .total_cmp(&b.window().start().value())
            .then_with(|| a.id().cmp(&b.id()))
    });
}
