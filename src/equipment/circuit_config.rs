// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Circuit configuration entries.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValueError;
use crate::types::{DeviceBinding, EquipmentId};

use super::EquipmentConfig;

/// Configuration of one circuit, as exported by the equipment config store.
///
/// The `master` flag accepts `true`/`false` as well as `1`/`0`. A circuit is
/// bound only when both `connectionId` and `deviceBinding` are present and
/// non-empty.
///
/// # Examples
///
/// ```
/// use circuit_sync::equipment::CircuitConfig;
///
/// // Virtual circuit
/// let lights = CircuitConfig::new(3, "Pool Light").as_master();
/// assert!(lights.binding().is_none());
///
/// // Bound circuit
/// let pump = CircuitConfig::new(5, "Filter Pump")
///     .as_master()
///     .with_binding("c1", "b1");
/// assert_eq!(pump.binding().unwrap().connection_id(), "c1");
///
/// // From the config store's JSON export
/// let parsed: CircuitConfig = serde_json::from_str(
///     r#"{ "id": 5, "name": "Filter Pump", "master": 1, "connectionId": "c1", "deviceBinding": "b1" }"#,
/// ).unwrap();
/// assert_eq!(parsed, pump);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitConfig {
    /// Circuit id, unique among circuits.
    pub id: EquipmentId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether this circuit is independently controlled.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub master: bool,
    /// Connection the bound device is reached through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// Binding of the device on that connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_binding: Option<String>,
}

impl CircuitConfig {
    /// Creates an unbound, non-master entry.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: EquipmentId::new(id),
            name: name.into(),
            master: false,
            connection_id: None,
            device_binding: None,
        }
    }

    /// Marks the entry as master.
    #[must_use]
    pub fn as_master(mut self) -> Self {
        self.master = true;
        self
    }

    /// Binds the entry to a device.
    #[must_use]
    pub fn with_binding(
        mut self,
        connection_id: impl Into<String>,
        device_binding: impl Into<String>,
    ) -> Self {
        self.connection_id = Some(connection_id.into());
        self.device_binding = Some(device_binding.into());
        self
    }

    /// Returns the device binding, or `None` for a virtual circuit.
    #[must_use]
    pub fn binding(&self) -> Option<DeviceBinding> {
        DeviceBinding::from_parts(self.connection_id.as_deref(), self.device_binding.as_deref())
    }
}

impl EquipmentConfig for CircuitConfig {
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

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => Ok(flag),
        Flag::Number(0) => Ok(false),
        Flag::Number(1) => Ok(true),
        Flag::Number(other) => Err(D::Error::custom(ValueError::InvalidFlag(other.to_string()))),
        Flag::Text(text) => match text.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(D::Error::custom(ValueError::InvalidFlag(other.to_string()))),
        },
    }
}
