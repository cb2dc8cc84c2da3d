// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control panel owning the equipment collections.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::collection::{CollectionOptions, EquipmentCollection};
use crate::config::PanelConfig;
use crate::equipment::{Circuit, CircuitConfig, PanelHandle, StateOutcome};
use crate::error::Result;
use crate::event::StateEvent;
use crate::protocol::DeviceService;
use crate::state::{LiveState, LiveStateStore};
use crate::types::EquipmentId;

/// Top-level aggregate of one automation controller.
///
/// The panel owns its circuit collection and the [`LiveStateStore`] that
/// collection publishes to. Units only receive a [`PanelHandle`], so they
/// never keep the panel alive.
///
/// # Examples
///
/// ```no_run
/// use circuit_sync::ControlPanel;
/// use circuit_sync::config::PanelConfig;
/// use circuit_sync::types::EquipmentId;
///
/// #[tokio::main]
/// async fn main() -> circuit_sync::Result<()> {
///     let config = PanelConfig::from_json(&std::fs::read_to_string("panel.json").unwrap())?;
///     let panel = ControlPanel::open(&config).await?;
///
///     let mut events = panel.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {event:?}");
///         }
///     });
///
///     panel.set_circuit_state(EquipmentId::new(5), true).await?;
///
///     panel.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ControlPanel<S: DeviceService> {
    handle: PanelHandle<S>,
    circuits: EquipmentCollection<Circuit<S>>,
}

impl<S: DeviceService> ControlPanel<S> {
    /// Creates an empty panel.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, service: Arc<S>, options: CollectionOptions) -> Self {
        let handle = PanelHandle::new(name, service);
        let circuits = EquipmentCollection::new(handle.clone(), LiveStateStore::new(), options);
        Self { handle, circuits }
    }

    /// Creates an empty panel named and timed after `config`.
    ///
    /// Circuits are not instantiated; pass them to [`start`](Self::start).
    #[must_use]
    pub fn from_config(config: &PanelConfig, service: Arc<S>) -> Self {
        Self::new(config.name(), service, config.collection_options())
    }

    /// Returns the handle units use to reach this panel.
    #[must_use]
    pub fn handle(&self) -> &PanelHandle<S> {
        &self.handle
    }

    /// Returns the circuit collection.
    #[must_use]
    pub fn circuits(&self) -> &EquipmentCollection<Circuit<S>> {
        &self.circuits
    }

    /// Returns the published state of a circuit.
    #[must_use]
    pub fn circuit_state(&self, id: EquipmentId) -> LiveState {
        self.circuits.store().get(id)
    }

    /// Subscribes to state events of every collection.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.circuits.store().subscribe()
    }

    /// Drives a circuit to the desired state.
    ///
    /// # Errors
    ///
    /// Returns error if the circuit does not exist or its relay cannot be
    /// reached.
    pub async fn set_circuit_state(&self, id: EquipmentId, desired: bool) -> Result<StateOutcome> {
        self.circuits.set_state(id, desired).await
    }

    /// Instantiates the master circuits, validates them once and starts
    /// polling.
    ///
    /// Returns the number of instantiated circuits.
    pub async fn start<I>(&self, circuits: I) -> usize
    where
        I: IntoIterator<Item = CircuitConfig>,
    {
        let count = self.circuits.init_from_config(circuits).await;
        let faulted = self.circuits.validate_all().await;
        self.circuits.start_polling();

        tracing::info!(panel = %self.handle.name(), circuits = count, faulted, "Panel started");
        count
    }

    /// Stops polling and closes every circuit.
    ///
    /// Returns the number of circuits that could not be closed.
    pub async fn shutdown(&self) -> usize {
        let remaining = self.circuits.close_all().await;
        tracing::info!(panel = %self.handle.name(), remaining, "Panel shut down");
        remaining
    }
}

#[cfg(feature = "http")]
impl ControlPanel<crate::protocol::HttpDeviceService> {
    /// Builds the HTTP device service described by `config` and starts a
    /// panel with its circuits.
    ///
    /// # Errors
    ///
    /// Returns error if a connection has no usable host.
    pub async fn open(config: &PanelConfig) -> Result<Self> {
        let service = Arc::new(config.http_service()?);
        let panel = Self::from_config(config, service);
        panel.start(config.circuits.iter().cloned()).await;
        Ok(panel)
    }
}

impl<S: DeviceService> fmt::Debug for ControlPanel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPanel")
            .field("handle", &self.handle)
            .field("circuits", &self.circuits)
            .finish()
    }
}
