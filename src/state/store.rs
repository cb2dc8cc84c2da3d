// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store of live states keyed by equipment id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::event::{EventBus, StateEvent};
use crate::types::{CommStatus, EquipmentId};

use super::LiveState;

/// Shared store of [`LiveState`] per equipment id.
///
/// Cloning the store is cheap and every clone sees the same entries and
/// publishes on the same [`EventBus`]. Reads of unknown ids return the
/// default state.
#[derive(Debug, Clone, Default)]
pub struct LiveStateStore {
    states: Arc<RwLock<HashMap<EquipmentId, LiveState>>>,
    events: EventBus,
}

impl LiveStateStore {
    /// Creates an empty store with its own event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store publishing on the given bus.
    #[must_use]
    pub fn with_event_bus(events: EventBus) -> Self {
        Self {
            states: Arc::default(),
            events,
        }
    }

    /// Subscribes to state events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Returns the bus this store publishes on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the state of a unit.
    #[must_use]
    pub fn get(&self, id: EquipmentId) -> LiveState {
        self.states.read().get(&id).copied().unwrap_or_default()
    }

    /// Returns true if the unit has an entry.
    #[must_use]
    pub fn contains(&self, id: EquipmentId) -> bool {
        self.states.read().contains_key(&id)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Returns true if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    /// Returns every entry, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(EquipmentId, LiveState)> {
        let mut entries: Vec<_> = self
            .states
            .read()
            .iter()
            .map(|(id, state)| (*id, *state))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Sets the on/off state of a unit and publishes the change.
    ///
    /// Returns true if the state changed.
    pub fn set_on(&self, id: EquipmentId, is_on: bool) -> bool {
        let changed = self.states.write().entry(id).or_default().set_on(is_on);

        if changed {
            tracing::debug!(%id, is_on, "Published power state");
            self.events.publish(StateEvent::power_changed(id, is_on));
        }
        changed
    }

    /// Records the communication status of a unit and publishes the change.
    ///
    /// Returns true if the status changed.
    pub fn set_comm_status(&self, id: EquipmentId, status: CommStatus) -> bool {
        let changed = self
            .states
            .write()
            .entry(id)
            .or_default()
            .set_comm_status(status, Utc::now());

        if changed {
            tracing::debug!(%id, %status, "Published communication status");
            self.events
                .publish(StateEvent::comm_status_changed(id, status));
        }
        changed
    }

    /// Removes the entry of a unit.
    pub fn remove(&self, id: EquipmentId) -> Option<LiveState> {
        self.states.write().remove(&id)
    }
}
