//! Maintenance of availability tables and slots from external inputs.
//!
//! [`BookingEngine`] reacts to two kinds of events: a ground-station
//! channel's rules changed, or pass predictions changed. Either way it pulls
//! fresh inputs through the [`ports`](crate::ports) traits, recomputes what
//! is derived, and reconciles the resulting candidate slots with the
//! bookings held by its [`BookingCoordinator`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::availability::{AvailabilityTable, RuleError, TableDiff};
use crate::booking::{BookingCoordinator, BookingError, ReconcileOutcome};
use crate::config::{ConfigError, EngineConfig};
use crate::ports::{ChannelPair, ConfigurationStore, PassPredictor, PortError, VisibilityWindow};
use crate::slots::{OperationalSlot, Party, SlotGenerator, SlotId};
use crate::time::TimeWindow;
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Collaborator failed: {0}")]
    Collaborator(#[from] PortError),
}

/// What one maintenance pass changed.
///
/// `failed` lists channels that could not be maintained; everything else
/// covers the channels that were.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    /// Availability windows that appeared.
    pub added: Vec<TimeWindow>,
    /// Availability windows that disappeared.
    pub removed: Vec<TimeWindow>,
    /// Slots offered for the first time.
    pub created: Vec<SlotId>,
    /// Free slots no longer offered.
    pub withdrawn: Vec<SlotId>,
    /// Slots regenerated unchanged.
    pub kept: usize,
    /// Channels skipped by [`BookingEngine::refresh_all`], with the reason.
    pub failed: Vec<(Id, EngineError)>,
}

impl MaintenanceReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.created.is_empty()
            && self.withdrawn.is_empty()
    }

    fn absorb_diff(&mut self, diff: TableDiff) {
        self.added.extend(diff.added);
        self.removed.extend(diff.removed);
    }

    fn absorb_outcome(&mut self, outcome: ReconcileOutcome) {
        self.created.extend(outcome.created);
        self.withdrawn.extend(outcome.withdrawn);
        self.kept += outcome.kept;
    }

    fn merge(&mut self, other: MaintenanceReport) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.created.extend(other.created);
        self.withdrawn.extend(other.withdrawn);
        self.kept += other.kept;
        self.failed.extend(other.failed);
    }
}

type TableHandle = Arc<Mutex<AvailabilityTable>>;

/// Availability tables, slot generation and booking behind one handle.
///
/// Lock order is table, then slot partition. Booking calls only take slot
/// partitions, so they proceed while another channel is being maintained.
#[derive(Debug)]
pub struct BookingEngine<S, P> {
    store: S,
    predictor: P,
    config: EngineConfig,
    generator: SlotGenerator,
    tables: RwLock<BTreeMap<Id, TableHandle>>,
    coordinator: BookingCoordinator,
}

impl<S: ConfigurationStore, P: PassPredictor> BookingEngine<S, P> {
    pub fn new(store: S, predictor: P, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            store,
            predictor,
            generator: SlotGenerator::new(config.min_slot_duration()),
            config,
            tables: RwLock::new(BTreeMap::new()),
            coordinator: BookingCoordinator::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }

    /// Snapshot of a channel's availability, if it was ever computed.
    pub fn table(&self, groundstation_channel: &str) -> Option<AvailabilityTable> {
        let handle = self.tables.read().get(groundstation_channel).cloned()?;
        let table = handle.lock().clone();
        Some(table)
    }

    /// Recomputes `groundstation_channel`'s availability from the store's
    /// current rules, then regenerates its slots.
    ///
    /// Inputs are read while the channel's table is locked, so concurrent
    /// passes for one channel commit in the order they read the store. Every
    /// input is fetched before anything is modified; a collaborator or rule
    /// failure leaves both the table and the slots untouched.
    pub fn rules_changed(
        &self,
        groundstation_channel: &str,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceReport, EngineError> {
        let horizon = self.config.horizon_from(now)?;
        let handle = self.table_handle(groundstation_channel);
        let mut table = handle.lock();

        let rules = self.store.rules(groundstation_channel)?;
        let pairs = self.pairs_for(groundstation_channel)?;
        let windows = self.visibility(&pairs, horizon)?;
        let diff = table.recompute(&rules, horizon)?;

        let mut report = MaintenanceReport::default();
        report.absorb_diff(diff);
        report.absorb_outcome(self.regenerate(&table, &pairs, &windows));
        Ok(report)
    }

    /// Regenerates the slots of every channel with a computed table from
    /// fresh pass predictions. Availability itself is not recomputed.
    pub fn windows_changed(&self, now: DateTime<Utc>) -> Result<MaintenanceReport, EngineError> {
        let horizon = self.config.horizon_from(now)?;
        let handles: Vec<(Id, TableHandle)> = self
            .tables
            .read()
            .iter()
            .map(|(channel, handle)| (channel.clone(), handle.clone()))
            .collect();

        let mut report = MaintenanceReport::default();
        for (channel, handle) in handles {
            let table = handle.lock();
            let pairs = self.pairs_for(&channel)?;
            let windows = self.visibility(&pairs, horizon)?;
            report.absorb_outcome(self.regenerate(&table, &pairs, &windows));
        }
        info!(
            "pass predictions refreshed: {} slot(s) created, {} withdrawn",
            report.created.len(),
            report.withdrawn.len()
        );
        Ok(report)
    }

    /// Runs [`BookingEngine::rules_changed`] for every channel the store
    /// knows about or that already has a table.
    ///
    /// A failing channel is recorded in [`MaintenanceReport::failed`] and the
    /// remaining channels are still refreshed. Only failures that affect
    /// every channel (configuration, listing the channels) are returned as
    /// errors.
    pub fn refresh_all(&self, now: DateTime<Utc>) -> Result<MaintenanceReport, EngineError> {
        self.config.horizon_from(now)?;
        let mut channels: BTreeSet<Id> = self.tables.read().keys().cloned().collect();
        channels.extend(
            self.store
                .compatible_pairs()?
                .into_iter()
                .map(|p| p.groundstation_channel),
        );

        let mut report = MaintenanceReport::default();
        for channel in &channels {
            match self.rules_changed(channel, now) {
                Ok(done) => report.merge(done),
                Err(e) => {
                    warn!("channel {} not refreshed: {}", channel, e);
                    report.failed.push((channel.clone(), e));
                }
            }
        }
        info!(
            "refreshed {} of {} channel(s): +{} / -{} window(s), {} slot(s) created, {} withdrawn",
            channels.len() - report.failed.len(),
            channels.len(),
            report.added.len(),
            report.removed.len(),
            report.created.len(),
            report.withdrawn.len()
        );
        Ok(report)
    }

    pub fn select(
        &self,
        spacecraft_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.coordinator.select(spacecraft_id, ids)
    }

    pub fn confirm(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.coordinator.confirm(groundstation_id, ids)
    }

    pub fn deny(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.coordinator.deny(groundstation_id, ids)
    }

    pub fn cancel(
        &self,
        groundstation_id: &str,
        ids: &[SlotId],
    ) -> Result<Vec<OperationalSlot>, BookingError> {
        self.coordinator.cancel(groundstation_id, ids)
    }

    pub fn get_changes(&self, party: &Party) -> Result<Vec<OperationalSlot>, BookingError> {
        self.coordinator.get_changes(party)
    }

    fn table_handle(&self, groundstation_channel: &str) -> TableHandle {
        if let Some(existing) = self.tables.read().get(groundstation_channel) {
            return existing.clone();
        }
        self.tables
            .write()
            .entry(groundstation_channel.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(AvailabilityTable::new(groundstation_channel))))
            .clone()
    }

    fn pairs_for(&self, groundstation_channel: &str) -> Result<Vec<ChannelPair>, PortError> {
        Ok(self
            .store
            .compatible_pairs()?
            .into_iter()
            .filter(|p| p.groundstation_channel == groundstation_channel)
            .collect())
    }

    /// Pass predictions for every distinct segment pair in `pairs`.
    fn visibility(
        &self,
        pairs: &[ChannelPair],
        horizon: TimeWindow,
    ) -> Result<Vec<VisibilityWindow>, PortError> {
        let segments: BTreeSet<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.spacecraft_id.as_str(), p.groundstation_id.as_str()))
            .collect();

        let mut windows = Vec::new();
        for (spacecraft_id, groundstation_id) in segments {
            let predicted =
                self.predictor
                    .visibility_windows(spacecraft_id, groundstation_id, horizon)?;
            debug!(
                "{} pass(es) of {} over {}",
                predicted.len(),
                spacecraft_id,
                groundstation_id
            );
            windows.extend(predicted);
        }
        Ok(windows)
    }

    fn regenerate(
        &self,
        table: &AvailabilityTable,
        pairs: &[ChannelPair],
        windows: &[VisibilityWindow],
    ) -> ReconcileOutcome {
        let candidates = self.generator.generate(table, pairs, windows);
        self.coordinator.reconcile(table.channel(), candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{AvailabilityRule, Operation};
    use crate::slots::SlotState;
    use crate::time;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use std::collections::HashMap;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;
    use std::time::Duration;

    const H: f64 = 3600.0;

    /// Signals when `rules` has taken its snapshot, then waits to be released.
    type Gate = (Sender<()>, Receiver<()>);

    #[derive(Debug, Default)]
    struct MemoryStore {
        rules: Mutex<HashMap<Id, Vec<AvailabilityRule>>>,
        pairs: Vec<ChannelPair>,
        fail: Mutex<bool>,
        gate: Mutex<Option<Gate>>,
    }

    impl MemoryStore {
        fn set_rules(&self, channel: &str, rules: Vec<AvailabilityRule>) {
            self.rules.lock().insert(channel.to_string(), rules);
        }
    }

    impl ConfigurationStore for MemoryStore {
        fn rules(&self, groundstation_channel: &str) -> Result<Vec<AvailabilityRule>, PortError> {
            if *self.fail.lock() {
                return Err(PortError("store offline".into()));
            }
            let snapshot = self
                .rules
                .lock()
                .get(groundstation_channel)
                .cloned()
                .unwrap_or_default();
            let gate = self.gate.lock().take();
            if let Some((entered, release)) = gate {
                let _ = entered.send(());
                let _ = release.recv();
            }
            Ok(snapshot)
        }

        fn compatible_pairs(&self) -> Result<Vec<ChannelPair>, PortError> {
            Ok(self.pairs.clone())
        }
    }

    #[derive(Debug, Default)]
    struct FixedPasses {
        windows: Mutex<Vec<VisibilityWindow>>,
    }

    impl PassPredictor for FixedPasses {
        fn visibility_windows(
            &self,
            spacecraft_id: &str,
            groundstation_id: &str,
            horizon: TimeWindow,
        ) -> Result<Vec<VisibilityWindow>, PortError> {
            Ok(self
                .windows
                .lock()
                .iter()
                .filter(|w| {
                    w.spacecraft_id == spacecraft_id
                        && w.groundstation_id == groundstation_id
                        && w.window.overlaps(&horizon)
                })
                .cloned()
                .collect())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
    }

    fn w(start_h: f64, end_h: f64) -> TimeWindow {
        let base = time::at(day(), t(0)).value();
        TimeWindow::from_f64(base + start_h * H, base + end_h * H)
    }

    fn rule(id: &str, channel: &str, op: Operation, start: u32, end: u32) -> AvailabilityRule {
        AvailabilityRule::once(id, channel, op, day(), t(start), t(end)).unwrap()
    }

    fn engine() -> BookingEngine<MemoryStore, FixedPasses> {
        engine_with_pairs(vec![ChannelPair::new("sc-1", "sc-ch", "gs-1", "gs-ch")])
    }

    fn engine_with_pairs(pairs: Vec<ChannelPair>) -> BookingEngine<MemoryStore, FixedPasses> {
        let store = MemoryStore {
            pairs,
            ..Default::default()
        };
        store.set_rules("gs-ch", vec![rule("r1", "gs-ch", Operation::Add, 8, 12)]);
        let passes = FixedPasses::default();
        *passes.windows.lock() = vec![
            VisibilityWindow::new("sc-1", "gs-1", w(9.0, 10.0)),
            VisibilityWindow::new("sc-1", "gs-1", w(13.0, 14.0)),
        ];
        BookingEngine::new(store, passes, EngineConfig::default()).unwrap()
    }

    #[test]
    fn rules_changed_builds_table_and_slots() {
        let engine = engine();
        let report = engine.rules_changed("gs-ch", now()).unwrap();
        assert_eq!(report.added, vec![w(8.0, 12.0)]);
        assert_eq!(report.created.len(), 1);

        let slot = engine.coordinator().slot(&report.created[0]).unwrap();
        assert_eq!(slot.window(), w(9.0, 10.0));
        assert_eq!(slot.state(), SlotState::Free);
        assert_eq!(engine.table("gs-ch").unwrap().intervals().len(), 1);
    }

    #[test]
    fn unchanged_inputs_keep_everything() {
        let engine = engine();
        engine.rules_changed("gs-ch", now()).unwrap();
        let again = engine.rules_changed("gs-ch", now()).unwrap();
        assert!(again.is_empty());
        assert_eq!(again.kept, 1);
    }

    #[test]
    fn removal_rule_withdraws_free_slot_but_keeps_reserved() {
        let engine = engine();
        let created = engine.rules_changed("gs-ch", now()).unwrap().created;
        engine.select("sc-1", &created).unwrap();
        engine.confirm("gs-1", &created).unwrap();

        engine.store.set_rules(
            "gs-ch",
            vec![
                rule("r1", "gs-ch", Operation::Add, 8, 12),
                rule("r2", "gs-ch", Operation::Remove, 9, 10),
            ],
        );
        let report = engine.rules_changed("gs-ch", now()).unwrap();
        assert_eq!(report.removed, vec![w(8.0, 12.0)]);
        assert_eq!(report.added, vec![w(8.0, 9.0), w(10.0, 12.0)]);
        assert!(report.withdrawn.is_empty());
        assert_eq!(
            engine.coordinator().slot(&created[0]).unwrap().state(),
            SlotState::Reserved
        );
    }

    #[test]
    fn removal_rule_withdraws_unbooked_slot() {
        let engine = engine();
        let created = engine.rules_changed("gs-ch", now()).unwrap().created;
        engine.store.set_rules("gs-ch", Vec::new());
        let report = engine.rules_changed("gs-ch", now()).unwrap();
        assert_eq!(report.withdrawn, created);
        assert!(engine.coordinator().is_empty());
    }

    #[test]
    fn new_pass_creates_slot_on_windows_changed() {
        let engine = engine();
        engine.rules_changed("gs-ch", now()).unwrap();
        engine
            .predictor
            .windows
            .lock()
            .push(VisibilityWindow::new("sc-1", "gs-1", w(11.0, 13.0)));

        let report = engine.windows_changed(now()).unwrap();
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.kept, 1);
        assert!(report.added.is_empty());
        let slot = engine.coordinator().slot(&report.created[0]).unwrap();
        assert_eq!(slot.window(), w(11.0, 12.0));
    }

    #[test]
    fn refresh_all_covers_every_store_channel() {
        let engine = engine();
        let report = engine.refresh_all(now()).unwrap();
        assert_eq!(report.created.len(), 1);
        assert!(engine.table("gs-ch").is_some());
    }

    #[test]
    fn store_failure_leaves_state_untouched() {
        let engine = engine();
        engine.rules_changed("gs-ch", now()).unwrap();
        *engine.store.fail.lock() = true;
        engine.store.set_rules("gs-ch", Vec::new());

        let err = engine.rules_changed("gs-ch", now()).unwrap_err();
        assert!(matches!(err, EngineError::Collaborator(_)));
        assert_eq!(engine.coordinator().len(), 1);
        assert_eq!(engine.table("gs-ch").unwrap().intervals().len(), 1);
    }

    #[test]
    fn foreign_rule_is_rejected() {
        let engine = engine();
        engine
            .store
            .set_rules("gs-ch", vec![rule("x", "gs-other", Operation::Add, 8, 12)]);
        let err = engine.rules_changed("gs-ch", now()).unwrap_err();
        assert!(matches!(err, EngineError::Rule(RuleError::ForeignChannel { .. })));
        assert!(engine.coordinator().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.horizon.days = 0;
        let err = BookingEngine::new(MemoryStore::default(), FixedPasses::default(), config)
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn booking_round_trip_through_engine() {
        let engine = engine();
        let created = engine.rules_changed("gs-ch", now()).unwrap().created;
        engine.select("sc-1", &created).unwrap();
        let gs_changes = engine
            .get_changes(&Party::GroundStation("gs-1".into()))
            .unwrap();
        assert_eq!(gs_changes.len(), 1);
        engine.deny("gs-1", &created).unwrap();
        let sc_changes = engine.get_changes(&Party::Spacecraft("sc-1".into())).unwrap();
        assert_eq!(sc_changes[0].state(), SlotState::Denied);
        assert_eq!(
            engine.coordinator().slot(&created[0]).unwrap().state(),
            SlotState::Free
        );
    }

    #[test]
    fn retracted_selection_is_withdrawn_once_denial_is_read() {
        let engine = engine();
        let created = engine.rules_changed("gs-ch", now()).unwrap().created;
        engine.select("sc-1", &created).unwrap();

        engine.store.set_rules("gs-ch", Vec::new());
        let report = engine.rules_changed("gs-ch", now()).unwrap();
        assert!(report.withdrawn.is_empty());
        assert_eq!(
            engine.coordinator().slot(&created[0]).unwrap().state(),
            SlotState::Selected
        );

        engine.deny("gs-1", &created).unwrap();
        let changes = engine.get_changes(&Party::Spacecraft("sc-1".into())).unwrap();
        assert_eq!(changes[0].state(), SlotState::Denied);
        assert!(engine.coordinator().slot(&created[0]).is_none());
        assert_eq!(
            engine.select("sc-1", &created).unwrap_err(),
            BookingError::UnknownSlot(created[0])
        );
    }

    #[test]
    fn concurrent_recomputes_commit_latest_rules() {
        let engine = Arc::new(engine());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *engine.store.gate.lock() = Some((entered_tx, release_rx));

        let first = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.rules_changed("gs-ch", now()))
        };
        // The first pass now holds a snapshot with rule r1.
        entered_rx.recv().unwrap();
        engine.store.set_rules("gs-ch", Vec::new());

        let second = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.rules_changed("gs-ch", now()))
        };
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();
        assert!(engine.table("gs-ch").unwrap().intervals().is_empty());
        assert!(engine.coordinator().is_empty());
    }

    #[test]
    fn refresh_all_continues_past_failing_channel() {
        let engine = engine_with_pairs(vec![
            ChannelPair::new("sc-1", "sc-ch", "gs-1", "gs-ch"),
            ChannelPair::new("sc-1", "sc-ch", "gs-9", "gs-bad"),
        ]);
        engine
            .store
            .set_rules("gs-bad", vec![rule("x", "gs-other", Operation::Add, 8, 12)]);

        let report = engine.refresh_all(now()).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "gs-bad");
        assert!(matches!(
            report.failed[0].1,
            EngineError::Rule(RuleError::ForeignChannel { .. })
        ));
        assert_eq!(report.created.len(), 1);
        assert_eq!(engine.table("gs-ch").unwrap().intervals().len(), 1);
    }
}
