// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint configuration for device service connections.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ProtocolError;

/// Configuration for one device service endpoint.
///
/// Each connection id used in equipment bindings maps to one of these. The
/// host may be a bare hostname/IP or a full `http://` / `https://` URL.
///
/// # Examples
///
/// ```
/// use circuit_sync::protocol::ConnectionConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = ConnectionConfig::new("192.168.1.100");
/// assert_eq!(config.base_url().unwrap(), "http://192.168.1.100");
///
/// // With all options
/// let config = ConnectionConfig::new("192.168.1.100")
///     .with_port(8443)
///     .with_https()
///     .with_credentials("admin", "password")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url().unwrap(), "https://192.168.1.100:8443");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    host: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    use_https: bool,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    ConnectionConfig::DEFAULT_TIMEOUT_MS
}

impl ConnectionConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    /// Creates a configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            use_https: false,
            username: None,
            password: None,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enables HTTPS.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        self
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the effective port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(if self.use_https {
            Self::DEFAULT_HTTPS_PORT
        } else {
            Self::DEFAULT_PORT
        })
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials if both parts are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the base URL for this endpoint, without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the host is empty.
    pub fn base_url(&self) -> Result<String, ProtocolError> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        if host.starts_with("http://") || host.starts_with("https://") {
            return Ok(host.to_string());
        }

        let scheme = if self.use_https { "https" } else { "http" };
        let port = self.port();
        let default_port = if self.use_https {
            Self::DEFAULT_HTTPS_PORT
        } else {
            Self::DEFAULT_PORT
        };
        let port_suffix = if port == default_port {
            String::new()
        } else {
            format!(":{port}")
        };
        Ok(format!("{scheme}://{host}{port_suffix}"))
    }
}
