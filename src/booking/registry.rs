//! Slot storage partitioned by ground-station channel.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::slots::{OperationalSlot, SlotId};
use crate::Id;

/// The slots of one ground-station channel.
#[derive(Debug, Default)]
pub(crate) struct Partition {
    pub(crate) slots: BTreeMap<SlotId, OperationalSlot>,
    /// Booked or transient slots the last reconcile no longer produced.
    /// They are dropped as soon as they fall back to `Free`.
    pub(crate) orphans: BTreeSet<SlotId>,
}

pub(crate) type PartitionHandle = Arc<Mutex<Partition>>;

/// Every slot known to the coordinator.
///
/// Each ground-station channel owns one partition behind its own mutex.
/// Operations that touch several partitions must lock them in ascending
/// channel order; [`SlotRegistry::partitions`] and
/// [`SlotRegistry::partitions_for`] already return them in that order.
///
/// The index lock is only ever taken while a partition lock is held, never
/// the other way round.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    partitions: RwLock<BTreeMap<Id, PartitionHandle>>,
    index: RwLock<HashMap<SlotId, Id>>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ground-station channel that holds `id`.
    pub(crate) fn locate(&self, id: &SlotId) -> Option<Id> {
        self.index.read().get(id).cloned()
    }

    pub(crate) fn partition(&self, channel: &str) -> Option<PartitionHandle> {
        self.partitions.read().get(channel).cloned()
    }

    pub(crate) fn partition_or_create(&self, channel: &str) -> PartitionHandle {
        if let Some(existing) = self.partition(channel) {
            return existing;
        }
        self.partitions
            .write()
            .entry(channel.to_string())
            .or_default()
            .clone()
    }

    /// Handles for `channels`, in ascending channel order.
    ///
    /// Returns `None` if any channel has no partition.
    pub(crate) fn partitions_for<'a>(
        &self,
        channels: impl IntoIterator<Item = &'a Id>,
    ) -> Option<Vec<PartitionHandle>> {
        let map = self.partitions.read();
        let mut wanted: Vec<&Id> = channels.into_iter().collect();
        wanted.sort();
        wanted.dedup();
        wanted.into_iter().map(|c| map.get(c).cloned()).collect()
    }

    /// Every partition, in ascending channel order.
    pub(crate) fn partitions(&self) -> Vec<(Id, PartitionHandle)> {
        self.partitions
            .read()
            .iter()
            .map(|(channel, handle)| (channel.clone(), handle.clone()))
            .collect()
    }

    /// Records membership changes of `channel`'s partition.
    ///
    /// Must be called while that partition's lock is held.
    pub(crate) fn reindex(&self, channel: &str, added: &[SlotId], removed: &[SlotId]) {
        let mut index = self.index.write();
        for id in removed {
            index.remove(id);
        }
        for id in added {
            index.insert(*id, channel.to_string());
        }
    }

    /// Number of slots across all partitions.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
