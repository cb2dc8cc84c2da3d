// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panel configuration document.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::collection::CollectionOptions;
use crate::equipment::CircuitConfig;
use crate::error::{ParseError, Result};
use crate::protocol::ConnectionConfig;

/// Name used when the document does not give one.
pub const DEFAULT_PANEL_NAME: &str = "panel";

/// Configuration of a control panel, as exported by the equipment config
/// store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use circuit_sync::config::PanelConfig;
///
/// let config = PanelConfig::from_json(r#"{
///     "name": "pool",
///     "pollingInterval": 5000,
///     "connections": { "c1": { "host": "192.168.1.50" } },
///     "circuits": [
///         { "id": 5, "name": "Filter Pump", "master": 1, "connectionId": "c1", "deviceBinding": "b1" },
///         { "id": 6, "name": "Cleaner", "master": 0 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(config.name(), "pool");
/// assert_eq!(config.collection_options().polling_interval(), Duration::from_secs(5));
/// assert_eq!(config.circuits.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    /// Display name of the panel.
    pub name: Option<String>,
    /// Interval between two revalidation passes, in milliseconds.
    pub polling_interval: Option<u64>,
    /// Device service endpoints, keyed by connection id.
    pub connections: HashMap<String, ConnectionConfig>,
    /// Circuit entries, master or not.
    pub circuits: Vec<CircuitConfig>,
}

impl PanelConfig {
    /// Parses and checks a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid JSON, does not match the
    /// expected shape, or sets a zero polling interval.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ParseError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns error if the polling interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval == Some(0) {
            return Err(ParseError::InvalidValue {
                field: "pollingInterval".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Returns the panel name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_PANEL_NAME)
    }

    /// Returns the collection options described by this document.
    #[must_use]
    pub fn collection_options(&self) -> CollectionOptions {
        match self.polling_interval {
            Some(ms) => CollectionOptions::new().with_polling_interval(Duration::from_millis(ms)),
            None => CollectionOptions::new(),
        }
    }

    /// Builds the HTTP device service for the configured connections.
    ///
    /// # Errors
    ///
    /// Returns error if a connection has no usable host.
    #[cfg(feature = "http")]
    pub fn http_service(&self) -> Result<crate::protocol::HttpDeviceService> {
        Ok(crate::protocol::HttpDeviceService::from_connections(
            &self.connections,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PanelConfig::from_json("{}").unwrap();
        assert_eq!(config.name(), DEFAULT_PANEL_NAME);
        assert_eq!(config.collection_options(), CollectionOptions::default());
        assert!(config.connections.is_empty());
        assert!(config.circuits.is_empty());
    }

    #[test]
    fn parses_connections_and_circuits() {
        let config = PanelConfig::from_json(
            r#"{
                "connections": {
                    "c1": { "host": "10.0.0.2", "port": 8080, "timeoutMs": 2000 }
                },
                "circuits": [
                    { "id": 1, "name": "Pump", "master": true, "connectionId": "c1", "deviceBinding": "r1" },
                    { "id": 2, "name": "Aux" }
                ]
            }"#,
        )
        .unwrap();

        let c1 = &config.connections["c1"];
        assert_eq!(c1.port(), 8080);
        assert_eq!(c1.timeout(), Duration::from_secs(2));

        assert_eq!(config.circuits[0].binding().unwrap().device_binding(), "r1");
        assert!(!config.circuits[1].master);
    }

    #[test]
    fn zero_polling_interval_is_rejected() {
        let err = PanelConfig::from_json(r#"{ "pollingInterval": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = PanelConfig::from_json(r#"{ "circuits": [ { "name": "no id" } ] }"#).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Json(_))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_service_registers_connections() {
        let config = PanelConfig::from_json(r#"{ "connections": { "c1": { "host": "10.0.0.2" } } }"#)
            .unwrap();
        let service = config.http_service().unwrap();
        assert!(service.has_connection("c1"));
        assert!(!service.has_connection("c2"));
    }
}
