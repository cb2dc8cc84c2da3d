// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP device service implementation.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};

use crate::error::ProtocolError;
use crate::protocol::{ConnectionConfig, DeviceResponse, DeviceService, ResponseStatus};

/// Resolved endpoint for one connection id.
#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl Endpoint {
    fn from_config(config: &ConnectionConfig) -> Result<Self, ProtocolError> {
        Ok(Self {
            base_url: config.base_url()?,
            credentials: config
                .credentials()
                .map(|(u, p)| (u.to_string(), p.to_string())),
            timeout: config.timeout(),
        })
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Device service that reaches relay endpoints over HTTP.
///
/// Each connection id is registered with a [`ConnectionConfig`]. Requests
/// to an id that was never registered fail with
/// [`ProtocolError::UnknownConnection`]. Every answer the endpoint gives,
/// including non-2xx ones, comes back as a [`DeviceResponse`].
///
/// # Examples
///
/// ```no_run
/// use circuit_sync::protocol::{ConnectionConfig, DeviceService, HttpDeviceService};
///
/// # async fn example() -> circuit_sync::Result<()> {
/// let service = HttpDeviceService::new()?
///     .with_connection("c1", &ConnectionConfig::new("192.168.1.40"))?;
///
/// let response = service.get("c1", "/status/device/b1").await?;
/// println!("{} {}", response.status().code(), response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpDeviceService {
    client: Client,
    endpoints: HashMap<String, Endpoint>,
}

impl HttpDeviceService {
    /// Creates a service with no registered connections.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, ProtocolError> {
        let client = Client::builder().build().map_err(ProtocolError::Http)?;

        Ok(Self {
            client,
            endpoints: HashMap::new(),
        })
    }

    /// Creates a service from a map of connection ids to endpoint configs.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created or an endpoint
    /// config has no usable host.
    pub fn from_connections<'a, I>(connections: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = (&'a String, &'a ConnectionConfig)>,
    {
        let mut service = Self::new()?;
        for (id, config) in connections {
            service.add_connection(id.clone(), config)?;
        }
        Ok(service)
    }

    /// Registers a connection, builder style.
    ///
    /// # Errors
    ///
    /// Returns error if the config has no usable host.
    pub fn with_connection(
        mut self,
        connection_id: impl Into<String>,
        config: &ConnectionConfig,
    ) -> Result<Self, ProtocolError> {
        self.add_connection(connection_id, config)?;
        Ok(self)
    }

    /// Registers or replaces a connection.
    ///
    /// # Errors
    ///
    /// Returns error if the config has no usable host.
    pub fn add_connection(
        &mut self,
        connection_id: impl Into<String>,
        config: &ConnectionConfig,
    ) -> Result<(), ProtocolError> {
        let endpoint = Endpoint::from_config(config)?;
        self.endpoints.insert(connection_id.into(), endpoint);
        Ok(())
    }

    /// Returns true if the connection id is registered.
    #[must_use]
    pub fn has_connection(&self, connection_id: &str) -> bool {
        self.endpoints.contains_key(connection_id)
    }

    /// Builds the full URL for a path on a connection.
    ///
    /// Each path segment is percent-encoded.
    fn url(&self, connection_id: &str, path: &str) -> Result<(String, &Endpoint), ProtocolError> {
        let endpoint = self
            .endpoints
            .get(connection_id)
            .ok_or_else(|| ProtocolError::UnknownConnection(connection_id.to_string()))?;

        let encoded = path
            .trim_start_matches('/')
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        Ok((format!("{}/{encoded}", endpoint.base_url), endpoint))
    }

    fn request(
        &self,
        method: Method,
        connection_id: &str,
        path: &str,
    ) -> Result<(RequestBuilder, u64), ProtocolError> {
        let (url, endpoint) = self.url(connection_id, path)?;

        tracing::debug!(%method, url = %url, "Sending device request");

        let mut request = self
            .client
            .request(method, &url)
            .timeout(endpoint.timeout);
        if let Some((username, password)) = &endpoint.credentials {
            request = request.basic_auth(username, Some(password));
        }
        Ok((request, endpoint.timeout_ms()))
    }

    async fn send(request: RequestBuilder, timeout_ms: u64) -> Result<DeviceResponse, ProtocolError> {
        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout_ms))?;

        let status = response.status();
        let status = ResponseStatus::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
        );

        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout_ms))?;

        tracing::debug!(code = status.code(), body = %text, "Received device response");

        Ok(DeviceResponse::new(status, parse_body(text)))
    }
}

impl DeviceService for HttpDeviceService {
    async fn get(&self, connection_id: &str, path: &str) -> Result<DeviceResponse, ProtocolError> {
        let (request, timeout_ms) = self.request(Method::GET, connection_id, path)?;
        Self::send(request, timeout_ms).await
    }

    async fn put(
        &self,
        connection_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DeviceResponse, ProtocolError> {
        let (request, timeout_ms) = self.request(Method::PUT, connection_id, path)?;
        Self::send(request.json(body), timeout_ms).await
    }
}

fn map_transport_error(error: reqwest::Error, timeout_ms: u64) -> ProtocolError {
    if error.is_timeout() {
        ProtocolError::Timeout(timeout_ms)
    } else if error.is_connect() {
        ProtocolError::ConnectionFailed(error.to_string())
    } else {
        ProtocolError::Http(error)
    }
}

/// Empty bodies become `null`; bodies that are not JSON are kept as strings.
fn parse_body(text: String) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(text),
    }
}
