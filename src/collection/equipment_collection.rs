// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic registry of equipment units.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::equipment::{Equipment, EquipmentConfig, Identifiable, PanelHandle, StateOutcome};
use crate::error::{Error, Result};
use crate::event::StateEvent;
use crate::state::LiveStateStore;
use crate::types::{CommStatus, EquipmentId};

use super::{CollectionOptions, PollTimer};

/// Ordered registry of equipment units of one kind.
///
/// The collection owns its units (handing them out as `Arc` for in-flight
/// calls only) and a recurring poll that revalidates every unit's
/// communication status. Ids are unique within a collection.
///
/// Cloning the collection is cheap; clones share the same units and poll.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use circuit_sync::collection::{CollectionOptions, EquipmentCollection};
/// use circuit_sync::equipment::{Circuit, CircuitConfig, PanelHandle};
/// use circuit_sync::protocol::HttpDeviceService;
/// use circuit_sync::state::LiveStateStore;
/// use circuit_sync::types::EquipmentId;
///
/// # async fn example() -> circuit_sync::Result<()> {
/// let panel = PanelHandle::new("pool", Arc::new(HttpDeviceService::new()?));
/// let circuits: EquipmentCollection<Circuit<HttpDeviceService>> =
///     EquipmentCollection::new(panel, LiveStateStore::new(), CollectionOptions::default());
///
/// circuits
///     .init_from_config([CircuitConfig::new(3, "Pool Light").as_master()])
///     .await;
/// circuits.start_polling();
///
/// circuits.set_state(EquipmentId::new(3), true).await?;
///
/// circuits.close_all().await;
/// # Ok(())
/// # }
/// ```
pub struct EquipmentCollection<E: Equipment> {
    inner: Arc<Inner<E>>,
}

struct Inner<E: Equipment> {
    members: RwLock<Vec<Arc<E>>>,
    panel: PanelHandle<E::Service>,
    store: LiveStateStore,
    options: CollectionOptions,
    timer: PollTimer,
    shut_down: AtomicBool,
}

enum Entry<E: Equipment> {
    Existing(Arc<E>, E::Config),
    Created(Arc<E>),
}

impl<E: Equipment> EquipmentCollection<E> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(
        panel: PanelHandle<E::Service>,
        store: LiveStateStore,
        options: CollectionOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                members: RwLock::new(Vec::new()),
                panel,
                store,
                options,
                timer: PollTimer::new(),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the store units publish their state to.
    #[must_use]
    pub fn store(&self) -> &LiveStateStore {
        &self.inner.store
    }

    /// Returns the handle to the owning panel.
    #[must_use]
    pub fn panel(&self) -> &PanelHandle<E::Service> {
        &self.inner.panel
    }

    /// Returns the collection options.
    #[must_use]
    pub fn options(&self) -> CollectionOptions {
        self.inner.options
    }

    /// Looks a unit up by id.
    pub async fn find(&self, id: EquipmentId) -> Option<Arc<E>> {
        self.inner
            .members
            .read()
            .await
            .iter()
            .find(|unit| unit.id() == id)
            .cloned()
    }

    /// Returns the number of units.
    pub async fn len(&self) -> usize {
        self.inner.members.read().await.len()
    }

    /// Returns true if the collection has no units.
    pub async fn is_empty(&self) -> bool {
        self.inner.members.read().await.is_empty()
    }

    /// Returns the ids of all units, in insertion order.
    pub async fn ids(&self) -> Vec<EquipmentId> {
        self.inner
            .members
            .read()
            .await
            .iter()
            .map(|unit| unit.id())
            .collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replaces the collection content with the master entries of `configs`.
    ///
    /// Entries without the master flag are skipped, as are repeated ids.
    /// No hook runs. Units already present are dropped without being closed
    /// and their published state is removed from the store. Returns the
    /// number of instantiated units.
    pub async fn init_from_config<I>(&self, configs: I) -> usize
    where
        I: IntoIterator<Item = E::Config>,
    {
        let mut members = self.inner.members.write().await;
        for unit in members.drain(..) {
            let id = unit.id();
            self.inner.store.remove(id);
            self.inner.store.events().publish(StateEvent::removed(id));
        }

        for config in configs {
            if !config.is_master() {
                continue;
            }
            let id = config.id();
            if members.iter().any(|unit| unit.id() == id) {
                tracing::warn!(kind = E::KIND, %id, "Skipping repeated id in configuration");
                continue;
            }
            members.push(Arc::new(self.inner.instantiate(config)));
            self.inner.store.events().publish(StateEvent::added(id));
        }

        tracing::debug!(kind = E::KIND, count = members.len(), "Collection initialized");
        members.len()
    }

    /// Returns the unit configured by `config`, creating it if needed.
    ///
    /// A new unit is marked master and its create hook runs. An existing
    /// unit receives `config` through its update hook.
    ///
    /// # Errors
    ///
    /// Returns the error of the hook that ran.
    pub async fn get_or_create(&self, config: E::Config) -> Result<Arc<E>> {
        match self.inner.entry(config).await {
            Entry::Existing(unit, config) => {
                unit.on_update(config).await?;
                Ok(unit)
            }
            Entry::Created(unit) => {
                unit.on_create().await?;
                Ok(unit)
            }
        }
    }

    /// Creates or updates the unit configured by `config`.
    ///
    /// # Errors
    ///
    /// Returns the error of the hook that ran.
    pub async fn create_or_update(&self, config: E::Config) -> Result<()> {
        self.get_or_create(config).await.map(|_| ())
    }

    /// Returns the unit configured by `config`, creating it if needed,
    /// without running any hook.
    pub async fn create_or_lookup(&self, config: E::Config) -> Arc<E> {
        match self.inner.entry(config).await {
            Entry::Existing(unit, _) | Entry::Created(unit) => unit,
        }
    }

    /// Drives unit `id` to the desired state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EquipmentNotFound`] if no unit has this id, or the
    /// unit's own error.
    pub async fn set_state(&self, id: EquipmentId, desired: bool) -> Result<StateOutcome> {
        let Some(unit) = self.find(id).await else {
            return Err(Error::EquipmentNotFound {
                kind: E::KIND,
                id,
                desired,
            });
        };
        unit.set_state(desired).await
    }

    /// Stops polling, then closes every unit from the last to the first.
    ///
    /// Units that close cleanly are removed. A unit whose close fails or
    /// panics is logged and kept. Returns the number of units left.
    pub async fn close_all(&self) -> usize {
        self.inner.shut_down.store(true, Ordering::SeqCst);
        self.inner.timer.cancel();

        let units: Vec<Arc<E>> = self.inner.members.read().await.clone();
        for unit in units.into_iter().rev() {
            let id = unit.id();
            let closing = Arc::clone(&unit);

            match tokio::spawn(async move { closing.close().await }).await {
                Ok(Ok(())) => {
                    self.inner
                        .members
                        .write()
                        .await
                        .retain(|member| !Arc::ptr_eq(member, &unit));
                    self.inner.store.events().publish(StateEvent::removed(id));
                }
                Ok(Err(e)) => {
                    tracing::warn!(kind = E::KIND, %id, error = %e, "Failed to close unit");
                }
                Err(e) => {
                    tracing::error!(kind = E::KIND, %id, error = %e, "Unit close panicked");
                }
            }
        }

        let remaining = self.len().await;
        tracing::debug!(kind = E::KIND, remaining, "Collection closed");
        remaining
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Revalidates every unit concurrently.
    ///
    /// Each unit runs in its own task; a panicking unit is logged and does
    /// not affect the others. Returns the number of units found faulted.
    pub async fn validate_all(&self) -> usize {
        self.inner.validate_all().await
    }

    /// Arms the recurring poll; the first pass runs after one interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_polling(&self) {
        self.inner.shut_down.store(false, Ordering::SeqCst);
        Inner::arm(&self.inner);
    }

    /// Runs one revalidation pass now and re-arms the poll.
    ///
    /// Any pending poll is cancelled first. The next pass is scheduled even
    /// if this one panicked, unless the collection was closed.
    pub async fn poll_tick(&self) {
        Arc::clone(&self.inner).tick().await;
    }

    /// Returns true if a poll is pending.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner.timer.is_pending()
    }
}

impl<E: Equipment> Inner<E> {
    fn instantiate(&self, mut config: E::Config) -> E {
        config.mark_master();
        E::from_config(config, self.panel.clone(), self.store.clone())
    }

    async fn entry(&self, config: E::Config) -> Entry<E> {
        let id = config.id();
        let mut members = self.members.write().await;

        if let Some(unit) = members.iter().find(|unit| unit.id() == id) {
            return Entry::Existing(Arc::clone(unit), config);
        }

        let unit = Arc::new(self.instantiate(config));
        members.push(Arc::clone(&unit));
        self.store.events().publish(StateEvent::added(id));
        tracing::debug!(kind = E::KIND, %id, "Unit created");
        Entry::Created(unit)
    }

    async fn validate_all(&self) -> usize {
        let units: Vec<Arc<E>> = self.members.read().await.clone();

        let mut checks = JoinSet::new();
        for unit in units {
            checks.spawn(async move {
                let id = unit.id();
                (id, unit.validate_setup().await)
            });
        }

        let mut faulted = 0;
        while let Some(result) = checks.join_next().await {
            match result {
                Ok((id, CommStatus::Fault)) => {
                    tracing::debug!(kind = E::KIND, %id, "Unit faulted");
                    faulted += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(kind = E::KIND, error = %e, "Unit validation panicked");
                }
            }
        }
        faulted
    }

    /// Schedules the next tick. Returns its generation, or `None` once the
    /// collection was closed.
    fn arm(this: &Arc<Self>) -> Option<u64> {
        if this.shut_down.load(Ordering::SeqCst) {
            return None;
        }

        let weak: Weak<Self> = Arc::downgrade(this);
        let generation = this
            .timer
            .schedule(this.options.polling_interval(), move |generation| async move {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation).await;
                }
            });
        Some(generation)
    }

    /// Runs the tick of timer `generation`, unless a newer timer replaced it.
    async fn fire(self: Arc<Self>, generation: u64) {
        // Only the timer still owning the slot may tick
        if !self.timer.release(generation) {
            return;
        }
        self.tick().await;
    }

    async fn tick(self: Arc<Self>) {
        self.timer.cancel();

        let pass = Arc::clone(&self);
        if let Err(e) = tokio::spawn(async move { pass.validate_all().await }).await {
            tracing::error!(kind = E::KIND, error = %e, "Poll pass panicked");
        }

        Self::arm(&self);
    }
}

impl<E: Equipment> Clone for EquipmentCollection<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Equipment> fmt::Debug for EquipmentCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquipmentCollection")
            .field("kind", &E::KIND)
            .field("panel", &self.inner.panel)
            .field("options", &self.inner.options)
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::equipment::{Closable, DeviceBound, HardwareStatus};
    use crate::protocol::scripted::ScriptedDeviceService;
    use crate::types::DeviceBinding;

    #[derive(Debug, Clone, Default)]
    struct Probe {
        validations: Arc<AtomicUsize>,
        creates: Arc<AtomicUsize>,
        updates: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    #[derive(Debug, Clone)]
    struct TestConfig {
        id: EquipmentId,
        master: bool,
        fail_close: bool,
        panic_on_validate: bool,
        probe: Probe,
    }

    impl TestConfig {
        fn new(id: u32, probe: &Probe) -> Self {
            Self {
                id: EquipmentId::new(id),
                master: true,
                fail_close: false,
                panic_on_validate: false,
                probe: probe.clone(),
            }
        }

        fn not_master(mut self) -> Self {
            self.master = false;
            self
        }
    }

    impl EquipmentConfig for TestConfig {
        fn id(&self) -> EquipmentId {
            self.id
        }

        fn is_master(&self) -> bool {
            self.master
        }

        fn mark_master(&mut self) {
            self.master = true;
        }
    }

    struct TestUnit {
        config: TestConfig,
        store: LiveStateStore,
    }

    impl Identifiable for TestUnit {
        fn id(&self) -> EquipmentId {
            self.config.id
        }

        fn name(&self) -> String {
            format!("unit {}", self.config.id)
        }
    }

    impl Closable for TestUnit {
        async fn close(&self) -> Result<()> {
            self.config.probe.closes.fetch_add(1, Ordering::SeqCst);
            if self.config.fail_close {
                return Err(Error::Unexpected("relay stuck".to_string()));
            }
            Ok(())
        }
    }

    impl DeviceBound for TestUnit {
        fn binding(&self) -> Option<DeviceBinding> {
            None
        }

        async fn check_hardware_status(&self) -> HardwareStatus {
            HardwareStatus::healthy()
        }

        async fn validate_setup(&self) -> CommStatus {
            self.config.probe.validations.fetch_add(1, Ordering::SeqCst);
            assert!(!self.config.panic_on_validate, "validation exploded");
            self.store.set_comm_status(self.config.id, CommStatus::Ok);
            CommStatus::Ok
        }
    }

    impl Equipment for TestUnit {
        const KIND: &'static str = "test unit";

        type Config = TestConfig;
        type Service = ScriptedDeviceService;

        fn from_config(
            config: TestConfig,
            _panel: PanelHandle<ScriptedDeviceService>,
            store: LiveStateStore,
        ) -> Self {
            Self { config, store }
        }

        async fn set_state(&self, desired: bool) -> Result<StateOutcome> {
            self.store.set_on(self.config.id, desired);
            Ok(StateOutcome::Local)
        }

        async fn on_create(&self) -> Result<()> {
            self.config.probe.creates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_update(&self, _config: TestConfig) -> Result<()> {
            self.config.probe.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn collection(interval: Duration) -> EquipmentCollection<TestUnit> {
        EquipmentCollection::new(
            PanelHandle::new("test", Arc::new(ScriptedDeviceService::new())),
            LiveStateStore::new(),
            CollectionOptions::new().with_polling_interval(interval),
        )
    }

    #[tokio::test]
    async fn init_keeps_only_master_entries() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));

        let configs = vec![
            TestConfig::new(1, &probe).not_master(),
            TestConfig::new(2, &probe),
            TestConfig::new(3, &probe).not_master(),
            TestConfig::new(4, &probe),
            TestConfig::new(5, &probe).not_master(),
        ];

        assert_eq!(units.init_from_config(configs).await, 2);
        assert_eq!(units.ids().await, vec![EquipmentId::new(2), EquipmentId::new(4)]);
        assert_eq!(probe.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn init_replaces_content_and_skips_repeated_ids() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(9, &probe)]).await;

        let count = units
            .init_from_config([TestConfig::new(1, &probe), TestConfig::new(1, &probe)])
            .await;

        assert_eq!(count, 1);
        assert_eq!(units.ids().await, vec![EquipmentId::new(1)]);
    }

    #[tokio::test]
    async fn init_drops_state_of_replaced_units() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(9, &probe)]).await;
        units.set_state(EquipmentId::new(9), true).await.unwrap();
        let mut events = units.store().subscribe();

        units.init_from_config([TestConfig::new(1, &probe)]).await;

        assert!(!units.store().contains(EquipmentId::new(9)));
        assert!(!units.store().get(EquipmentId::new(9)).is_on());
        assert_eq!(events.try_recv().unwrap(), StateEvent::removed(EquipmentId::new(9)));
        assert_eq!(events.try_recv().unwrap(), StateEvent::added(EquipmentId::new(1)));
    }

    #[tokio::test]
    async fn create_or_lookup_is_idempotent() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));

        let first = units.create_or_lookup(TestConfig::new(7, &probe).not_master()).await;
        let second = units.create_or_lookup(TestConfig::new(7, &probe)).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.config.master);
        assert_eq!(units.len().await, 1);
        assert_eq!(probe.creates.load(Ordering::SeqCst), 0);
        assert_eq!(probe.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_or_create_runs_create_then_update_hooks() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        let mut events = units.store().subscribe();

        units.create_or_update(TestConfig::new(7, &probe)).await.unwrap();
        units.create_or_update(TestConfig::new(7, &probe)).await.unwrap();

        assert_eq!(units.len().await, 1);
        assert_eq!(probe.creates.load(Ordering::SeqCst), 1);
        assert_eq!(probe.updates.load(Ordering::SeqCst), 1);
        assert_eq!(events.try_recv().unwrap(), StateEvent::added(EquipmentId::new(7)));
    }

    #[tokio::test]
    async fn set_state_on_unknown_id_fails() {
        let units = collection(Duration::from_secs(10));

        let err = units.set_state(EquipmentId::new(42), true).await.unwrap_err();
        assert!(matches!(
            err,
            Error::EquipmentNotFound { kind: "test unit", desired: true, .. }
        ));
    }

    #[tokio::test]
    async fn set_state_delegates_to_unit() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(3, &probe)]).await;

        let outcome = units.set_state(EquipmentId::new(3), true).await.unwrap();
        assert_eq!(outcome, StateOutcome::Local);
        assert!(units.store().get(EquipmentId::new(3)).is_on());
    }

    #[tokio::test]
    async fn close_all_keeps_only_failing_unit() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));

        let mut stuck = TestConfig::new(2, &probe);
        stuck.fail_close = true;
        units
            .init_from_config([TestConfig::new(1, &probe), stuck, TestConfig::new(3, &probe)])
            .await;

        assert_eq!(units.close_all().await, 1);
        assert_eq!(units.ids().await, vec![EquipmentId::new(2)]);
        assert_eq!(probe.closes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validate_all_isolates_panicking_unit() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));

        let mut broken = TestConfig::new(2, &probe);
        broken.panic_on_validate = true;
        units
            .init_from_config([TestConfig::new(1, &probe), broken, TestConfig::new(3, &probe)])
            .await;

        assert_eq!(units.validate_all().await, 0);
        assert_eq!(probe.validations.load(Ordering::SeqCst), 3);
        assert!(units.store().get(EquipmentId::new(3)).last_checked().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_tick_reschedules_after_panicking_pass() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));

        let mut broken = TestConfig::new(1, &probe);
        broken.panic_on_validate = true;
        units.init_from_config([broken]).await;

        units.poll_tick().await;
        assert!(units.is_polling());

        units.poll_tick().await;
        assert!(units.is_polling());
        assert_eq!(probe.validations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_timer_does_not_tick() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(1, &probe)]).await;

        let stale = Inner::arm(&units.inner).unwrap();
        let current = Inner::arm(&units.inner).unwrap();
        assert_ne!(stale, current);

        Arc::clone(&units.inner).fire(stale).await;
        assert!(units.is_polling());
        assert_eq!(probe.validations.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(probe.validations.load(Ordering::SeqCst), 1);
        assert!(units.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_repeats_every_interval() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(1, &probe)]).await;

        units.start_polling();
        assert!(units.is_polling());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(probe.validations.load(Ordering::SeqCst), 2);
        assert!(units.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn close_all_stops_polling() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(1, &probe)]).await;
        units.start_polling();

        units.close_all().await;
        assert!(!units.is_polling());

        units.poll_tick().await;
        assert!(!units.is_polling());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(units.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_collection_stops_polling() {
        let probe = Probe::default();
        let units = collection(Duration::from_secs(10));
        units.init_from_config([TestConfig::new(1, &probe)]).await;
        units.start_polling();
        drop(units);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(probe.validations.load(Ordering::SeqCst), 0);
    }
}
