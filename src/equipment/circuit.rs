// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switchable output circuits.

use std::fmt;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::protocol::{DeviceService, StateWrite};
use crate::state::{LiveState, LiveStateStore};
use crate::types::{CommStatus, DeviceBinding, EquipmentId};

use super::{
    CircuitConfig, Closable, DeviceBound, Equipment, EquipmentConfig, HardwareStatus,
    Identifiable, PanelHandle, StateOutcome,
};

/// One switchable output, virtual or bound to a smart relay.
///
/// A virtual circuit commits every state write locally. A bound circuit
/// sends the write to its relay and commits it only when the relay answers
/// 200, so the published state never runs ahead of the hardware.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use circuit_sync::equipment::{Circuit, CircuitConfig, Equipment, PanelHandle};
/// use circuit_sync::protocol::{ConnectionConfig, HttpDeviceService};
/// use circuit_sync::state::LiveStateStore;
///
/// # async fn example() -> circuit_sync::Result<()> {
/// let service = HttpDeviceService::new()?
///     .with_connection("c1", &ConnectionConfig::new("192.168.1.50"))?;
/// let panel = PanelHandle::new("pool", Arc::new(service));
/// let store = LiveStateStore::new();
///
/// let config = CircuitConfig::new(5, "Filter Pump").with_binding("c1", "b1");
/// let pump = Circuit::from_config(config, panel, store.clone());
///
/// let outcome = pump.set_state(true).await?;
/// println!("committed: {}", outcome.is_committed());
/// # Ok(())
/// # }
/// ```
pub struct Circuit<S> {
    id: EquipmentId,
    config: RwLock<CircuitConfig>,
    panel: PanelHandle<S>,
    store: LiveStateStore,
}

impl<S> Circuit<S> {
    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> CircuitConfig {
        self.config.read().clone()
    }

    /// Returns the published state of this circuit.
    #[must_use]
    pub fn state(&self) -> LiveState {
        self.store.get(self.id)
    }

    /// Returns the handle to the owning panel.
    #[must_use]
    pub fn panel(&self) -> &PanelHandle<S> {
        &self.panel
    }
}

impl<S> fmt::Debug for Circuit<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("id", &self.id)
            .field("config", &*self.config.read())
            .field("panel", &self.panel)
            .finish_non_exhaustive()
    }
}

impl<S> Identifiable for Circuit<S> {
    fn id(&self) -> EquipmentId {
        self.id
    }

    fn name(&self) -> String {
        self.config.read().name.clone()
    }
}

impl<S: DeviceService> Closable for Circuit<S> {
    async fn close(&self) -> Result<()> {
        match self.set_state(false).await {
            Ok(outcome) if outcome.is_committed() => {
                tracing::debug!(id = %self.id, "Circuit closed");
            }
            Ok(outcome) => {
                let code = outcome.response().map(|r| r.status().code());
                tracing::warn!(id = %self.id, ?code, "Relay refused off command on close");
            }
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "Failed to switch circuit off on close");
            }
        }
        Ok(())
    }
}

impl<S: DeviceService> DeviceBound for Circuit<S> {
    fn binding(&self) -> Option<DeviceBinding> {
        self.config.read().binding()
    }

    async fn check_hardware_status(&self) -> HardwareStatus {
        let Some(binding) = self.binding() else {
            return HardwareStatus::healthy();
        };

        match self
            .panel
            .get(binding.connection_id(), &binding.status_path())
            .await
        {
            Ok(response) => {
                let status = HardwareStatus::from_response(&response);
                if status.has_fault() {
                    tracing::debug!(
                        id = %self.id,
                        %binding,
                        code = response.status().code(),
                        body = %response.body(),
                        "Relay reports fault"
                    );
                }
                status
            }
            Err(e) => {
                tracing::warn!(id = %self.id, %binding, error = %e, "Relay status check failed");
                HardwareStatus::faulted()
            }
        }
    }

    async fn validate_setup(&self) -> CommStatus {
        let status = if self.is_virtual() {
            CommStatus::Ok
        } else {
            CommStatus::from_fault(self.check_hardware_status().await.has_fault())
        };
        self.store.set_comm_status(self.id, status);
        status
    }
}

impl<S: DeviceService> Equipment for Circuit<S> {
    const KIND: &'static str = "circuit";

    type Config = CircuitConfig;
    type Service = S;

    fn from_config(config: CircuitConfig, panel: PanelHandle<S>, store: LiveStateStore) -> Self {
        Self {
            id: config.id,
            config: RwLock::new(config),
            panel,
            store,
        }
    }

    async fn set_state(&self, desired: bool) -> Result<StateOutcome> {
        let Some(binding) = self.binding() else {
            self.store.set_on(self.id, desired);
            return Ok(StateOutcome::Local);
        };

        let body = StateWrite::new(desired).to_body()?;
        let response = match self
            .panel
            .put(binding.connection_id(), &binding.state_path(), &body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(id = %self.id, %binding, desired, error = %e, "Relay write failed");
                return Err(e.into());
            }
        };

        if response.is_success() {
            self.store.set_on(self.id, desired);
        } else {
            tracing::warn!(
                id = %self.id,
                %binding,
                desired,
                code = response.status().code(),
                message = response.status().message(),
                "Relay rejected state write"
            );
        }
        Ok(StateOutcome::Device(response))
    }

    async fn on_create(&self) -> Result<()> {
        self.validate_setup().await;
        Ok(())
    }

    async fn on_update(&self, mut config: CircuitConfig) -> Result<()> {
        if config.id != self.id {
            return Err(Error::Unexpected(format!(
                "circuit {} cannot take the config of circuit {}",
                self.id, config.id
            )));
        }
        config.mark_master();

        let rebound = {
            let mut current = self.config.write();
            let rebound = current.binding() != config.binding();
            *current = config;
            rebound
        };

        if rebound {
            tracing::debug!(id = %self.id, "Circuit binding changed");
            self.validate_setup().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::protocol::scripted::{Reply, ScriptedDeviceService};

    fn circuit(
        config: CircuitConfig,
        service: &Arc<ScriptedDeviceService>,
    ) -> Circuit<ScriptedDeviceService> {
        Circuit::from_config(
            config,
            PanelHandle::new("pool", Arc::clone(service)),
            LiveStateStore::new(),
        )
    }

    fn pump(service: &Arc<ScriptedDeviceService>) -> Circuit<ScriptedDeviceService> {
        circuit(
            CircuitConfig::new(5, "Filter Pump").as_master().with_binding("c1", "b1"),
            service,
        )
    }

    #[tokio::test]
    async fn virtual_write_commits_locally() {
        let service = Arc::new(ScriptedDeviceService::new());
        let light = circuit(CircuitConfig::new(3, "Pool Light"), &service);

        assert!(light.is_virtual());
        assert_eq!(light.set_state(true).await.unwrap(), StateOutcome::Local);
        assert!(light.state().is_on());
        assert_eq!(light.set_state(false).await.unwrap(), StateOutcome::Local);
        assert!(!light.state().is_on());
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn bound_write_commits_on_200() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);

        let outcome = pump.set_state(true).await.unwrap();
        assert!(outcome.is_committed());
        assert!(pump.state().is_on());

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].connection_id, "c1");
        assert_eq!(requests[0].path, "/state/device/b1");
        assert_eq!(requests[0].body, Some(json!({ "isOn": true, "latch": 7000 })));
    }

    #[tokio::test]
    async fn bound_write_is_not_committed_on_failure_status() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply(
            "/state/device/b1",
            Reply::Status(503, json!({ "error": "busy" })),
        );
        let pump = pump(&service);

        let outcome = pump.set_state(true).await.unwrap();
        assert!(!outcome.is_committed());
        let response = outcome.response().unwrap();
        assert_eq!(response.status().code(), 503);
        assert_eq!(response.body(), &json!({ "error": "busy" }));
        assert!(!pump.state().is_on());
    }

    #[tokio::test]
    async fn bound_write_fails_when_unreachable() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply("/state/device/b1", Reply::Unreachable);
        let pump = pump(&service);

        let err = pump.set_state(true).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(!pump.state().is_on());
    }

    #[tokio::test]
    async fn virtual_circuit_is_always_healthy() {
        let service = Arc::new(ScriptedDeviceService::new());
        let light = circuit(CircuitConfig::new(3, "Pool Light"), &service);

        assert!(!light.check_hardware_status().await.has_fault());
        assert_eq!(light.validate_setup().await, CommStatus::Ok);
        assert!(light.state().last_checked().is_some());
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn virtual_circuit_clears_previous_fault() {
        let service = Arc::new(ScriptedDeviceService::new());
        let light = circuit(CircuitConfig::new(3, "Pool Light"), &service);
        light.store.set_comm_status(EquipmentId::new(3), CommStatus::Fault);

        assert_eq!(light.validate_setup().await, CommStatus::Ok);
        assert_eq!(light.state().comm_status(), CommStatus::Ok);
    }

    #[tokio::test]
    async fn rebinding_to_virtual_clears_fault() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply(
            "/status/device/b1",
            Reply::Status(200, json!({ "hasFault": true })),
        );
        let pump = pump(&service);
        assert_eq!(pump.validate_setup().await, CommStatus::Fault);

        pump.on_update(CircuitConfig::new(5, "Filter Pump")).await.unwrap();

        assert!(pump.is_virtual());
        assert_eq!(pump.state().comm_status(), CommStatus::Ok);
    }

    #[tokio::test]
    async fn failed_off_write_keeps_circuit_on() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);
        assert!(pump.set_state(true).await.unwrap().is_committed());

        service.reply("/state/device/b1", Reply::Status(500, json!({})));
        let outcome = pump.set_state(false).await.unwrap();
        assert!(!outcome.is_committed());
        assert!(pump.state().is_on());

        service.reply("/state/device/b1", Reply::Unreachable);
        assert!(pump.set_state(false).await.is_err());
        assert!(pump.state().is_on());
    }

    #[tokio::test]
    async fn validate_setup_follows_relay_status() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);

        assert_eq!(pump.validate_setup().await, CommStatus::Ok);

        service.reply(
            "/status/device/b1",
            Reply::Status(200, json!({ "hasFault": true })),
        );
        assert_eq!(pump.validate_setup().await, CommStatus::Fault);
        assert_eq!(pump.state().comm_status(), CommStatus::Fault);

        service.reply(
            "/status/device/b1",
            Reply::Status(200, json!({ "hasFault": false })),
        );
        assert_eq!(pump.validate_setup().await, CommStatus::Ok);
    }

    #[tokio::test]
    async fn failed_status_check_is_a_fault() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);

        service.reply("/status/device/b1", Reply::Unreachable);
        assert!(pump.check_hardware_status().await.has_fault());

        service.reply("/status/device/b1", Reply::Status(500, json!({})));
        assert_eq!(pump.validate_setup().await, CommStatus::Fault);
    }

    #[tokio::test]
    async fn write_success_is_independent_of_comm_status() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply(
            "/status/device/b1",
            Reply::Status(200, json!({ "hasFault": true })),
        );
        let pump = pump(&service);

        pump.validate_setup().await;
        assert!(pump.set_state(true).await.unwrap().is_committed());

        let state = pump.state();
        assert!(state.is_on());
        assert!(state.comm_status().is_fault());
    }

    #[tokio::test]
    async fn close_switches_off_and_never_fails() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);
        pump.set_state(true).await.unwrap();

        pump.close().await.unwrap();
        assert!(!pump.state().is_on());

        service.reply("/state/device/b1", Reply::Unreachable);
        assert!(pump.close().await.is_ok());
    }

    #[tokio::test]
    async fn on_create_validates() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply(
            "/status/device/b1",
            Reply::Status(200, json!({ "hasFault": true })),
        );
        let pump = pump(&service);

        pump.on_create().await.unwrap();
        assert!(pump.state().comm_status().is_fault());
    }

    #[tokio::test]
    async fn on_update_revalidates_only_on_rebind() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);

        let renamed = CircuitConfig::new(5, "Main Pump").with_binding("c1", "b1");
        pump.on_update(renamed).await.unwrap();
        assert_eq!(pump.name(), "Main Pump");
        assert!(pump.config().is_master());
        assert!(service.requests().is_empty());

        let rebound = CircuitConfig::new(5, "Main Pump").with_binding("c1", "b2");
        pump.on_update(rebound).await.unwrap();
        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/status/device/b2");
    }

    #[tokio::test]
    async fn on_update_rejects_foreign_id() {
        let service = Arc::new(ScriptedDeviceService::new());
        let pump = pump(&service);

        let err = pump.on_update(CircuitConfig::new(6, "Spa")).await.unwrap_err();
        assert!(matches!(err, Error::Unexpected(_)));
        assert_eq!(pump.name(), "Filter Pump");
    }
}
