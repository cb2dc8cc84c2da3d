// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controlled equipment units.
//!
//! An equipment unit wraps one configuration entry and is either *virtual*
//! (no device binding, state is authoritative locally) or *bound* to a
//! smart-relay endpoint through a [`DeviceBinding`]. Units are described by
//! a small set of capability traits so that one
//! [`EquipmentCollection`](crate::collection::EquipmentCollection) can manage
//! any kind of equipment:
//!
//! - [`Identifiable`]: stable id and display name
//! - [`Closable`]: orderly shutdown
//! - [`DeviceBound`]: optional binding and communication health checks
//! - [`Equipment`]: construction from config, state writes and lifecycle hooks
//!
//! [`Circuit`] is the switchable-output implementation.
//!
//! # Unit states
//!
//! Virtual units are always [`CommStatus::Ok`]. Bound units move between
//! healthy and faulted only through [`DeviceBound::validate_setup`]. Whether a
//! state write succeeds is independent of that status: a device can accept a
//! write and still be flagged faulted by the next poll.

mod circuit;
mod circuit_config;
mod panel_handle;

pub use circuit::Circuit;
pub use circuit_config::CircuitConfig;
pub use panel_handle::PanelHandle;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{DeviceResponse, DeviceService};
use crate::state::LiveStateStore;
use crate::types::{CommStatus, DeviceBinding, EquipmentId};

/// Outcome of a state write.
#[derive(Debug, Clone, PartialEq)]
pub enum StateOutcome {
    /// The unit is virtual; the state was committed locally.
    Local,
    /// The unit is bound; this is what the device answered.
    ///
    /// The state was committed only if the response status is 200.
    Device(DeviceResponse),
}

impl StateOutcome {
    /// Returns true if the requested state was committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        match self {
            Self::Local => true,
            Self::Device(response) => response.is_success(),
        }
    }

    /// Returns the device response, if a device was involved.
    #[must_use]
    pub fn response(&self) -> Option<&DeviceResponse> {
        match self {
            Self::Local => None,
            Self::Device(response) => Some(response),
        }
    }
}

/// Result of a hardware status check.
///
/// Parsed from a `{"hasFault": bool}` status body. Anything that is not a
/// clean 200 answer carrying that field counts as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareStatus {
    has_fault: bool,
}

impl HardwareStatus {
    /// A fault-free status.
    #[must_use]
    pub const fn healthy() -> Self {
        Self { has_fault: false }
    }

    /// A faulted status.
    #[must_use]
    pub const fn faulted() -> Self {
        Self { has_fault: true }
    }

    /// Returns true if the device is faulted.
    #[must_use]
    pub const fn has_fault(&self) -> bool {
        self.has_fault
    }

    /// Interprets a status response.
    #[must_use]
    pub fn from_response(response: &DeviceResponse) -> Self {
        if !response.is_success() {
            return Self::faulted();
        }
        response.parse().unwrap_or_else(|_| Self::faulted())
    }
}

/// Configuration entry of one equipment unit.
pub trait EquipmentConfig: Clone + Send + Sync + 'static {
    /// Returns the id of the configured unit.
    fn id(&self) -> EquipmentId;

    /// Returns true if the entry is independently controlled.
    fn is_master(&self) -> bool;

    /// Marks the entry as independently controlled.
    fn mark_master(&mut self);
}

/// Equipment with a stable identity.
pub trait Identifiable {
    /// Returns the unit id.
    fn id(&self) -> EquipmentId;

    /// Returns the display name.
    fn name(&self) -> String;
}

/// Equipment that can be shut down.
pub trait Closable {
    /// Shuts the unit down.
    ///
    /// # Errors
    ///
    /// Returns error if the unit could not be shut down. Collections log the
    /// error and keep the unit.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Equipment that may be bound to a device endpoint.
pub trait DeviceBound {
    /// Returns the binding, or `None` for a virtual unit.
    fn binding(&self) -> Option<DeviceBinding>;

    /// Returns true if the unit has no binding.
    fn is_virtual(&self) -> bool {
        self.binding().is_none()
    }

    /// Asks the bound device for its status.
    ///
    /// Never fails: an unreachable device or an unreadable answer is
    /// reported as faulted. Virtual units are always healthy.
    fn check_hardware_status(&self) -> impl Future<Output = HardwareStatus> + Send;

    /// Re-checks the device and publishes the resulting communication status.
    ///
    /// Returns the status that was published.
    fn validate_setup(&self) -> impl Future<Output = CommStatus> + Send;
}

/// A kind of equipment managed by a collection.
pub trait Equipment: Identifiable + Closable + DeviceBound + Send + Sync + Sized + 'static {
    /// Short name of the equipment kind, used in errors and logs.
    const KIND: &'static str;

    /// Configuration entry type.
    type Config: EquipmentConfig;

    /// Device service used to reach bound devices.
    type Service: DeviceService;

    /// Builds a unit from its configuration.
    fn from_config(
        config: Self::Config,
        panel: PanelHandle<Self::Service>,
        store: LiveStateStore,
    ) -> Self;

    /// Drives the unit to the desired state.
    ///
    /// # Errors
    ///
    /// Returns error if the device could not be reached. A device that
    /// answers with a failure status is not an error; see [`StateOutcome`].
    fn set_state(&self, desired: bool) -> impl Future<Output = Result<StateOutcome>> + Send;

    /// Runs once after the unit was created on demand.
    ///
    /// # Errors
    ///
    /// Returns error if the unit cannot be brought up.
    fn on_create(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Runs when an existing unit receives a new configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the new configuration cannot be applied.
    fn on_update(&self, config: Self::Config) -> impl Future<Output = Result<()>> + Send;
}
