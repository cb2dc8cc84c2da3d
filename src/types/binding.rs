// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device binding type.

use std::fmt;

/// Address of the smart-relay endpoint a unit is bound to.
///
/// A binding pairs the id of a configured connection (which device service
/// endpoint to talk to) with the device binding understood by that endpoint.
/// Units without a complete binding are virtual.
///
/// # Examples
///
/// ```
/// use circuit_sync::types::DeviceBinding;
///
/// let binding = DeviceBinding::new("c1", "gpio:0:17");
/// assert_eq!(binding.state_path(), "/state/device/gpio:0:17");
/// assert_eq!(binding.status_path(), "/status/device/gpio:0:17");
///
/// assert!(DeviceBinding::from_parts(Some("c1"), None).is_none());
/// assert!(DeviceBinding::from_parts(Some(""), Some("b1")).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceBinding {
    connection_id: String,
    device_binding: String,
}

impl DeviceBinding {
    /// Creates a binding from its two parts.
    #[must_use]
    pub fn new(connection_id: impl Into<String>, device_binding: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            device_binding: device_binding.into(),
        }
    }

    /// Builds a binding from optional configuration fields.
    ///
    /// Returns `None` when either part is missing or empty.
    #[must_use]
    pub fn from_parts(connection_id: Option<&str>, device_binding: Option<&str>) -> Option<Self> {
        match (connection_id, device_binding) {
            (Some(connection), Some(binding)) if !connection.is_empty() && !binding.is_empty() => {
                Some(Self::new(connection, binding))
            }
            _ => None,
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Returns the device binding.
    #[must_use]
    pub fn device_binding(&self) -> &str {
        &self.device_binding
    }

    /// Path used to write the relay state.
    ///
    /// The binding is passed through verbatim; transports escape it as they
    /// need.
    #[must_use]
    pub fn state_path(&self) -> String {
        format!("/state/device/{}", self.device_binding)
    }

    /// Path used to read the relay status.
    #[must_use]
    pub fn status_path(&self) -> String {
        format!("/status/device/{}", self.device_binding)
    }
}

impl fmt::Display for DeviceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.connection_id, self.device_binding)
    }
}
