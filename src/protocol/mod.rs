// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device service protocol for reaching smart-relay endpoints.
//!
//! Equipment never talks to the network directly. It goes through a
//! [`DeviceService`], which resolves a connection id to an endpoint and
//! performs `GET`/`PUT` requests against paths such as
//! `/status/device/{binding}` and `/state/device/{binding}`.
//!
//! # Implementations
//!
//! - [`HttpDeviceService`]: HTTP/HTTPS endpoints via `reqwest` (feature `http`)
//!
//! Any other transport can be plugged in by implementing [`DeviceService`].

mod connection;
#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use connection::ConnectionConfig;
#[cfg(feature = "http")]
pub use http::HttpDeviceService;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ProtocolError};

/// Status line of a device response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    code: u16,
    message: String,
}

impl ResponseStatus {
    /// Status code of a successful exchange.
    pub const OK: u16 = 200;

    /// Creates a status with the given code and message.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true for exactly 200; any other code counts as a failure.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

/// Response returned by a device service call.
///
/// Non-success codes are still responses, not errors, so callers keep the
/// device's own status and message for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponse {
    status: ResponseStatus,
    body: serde_json::Value,
}

impl DeviceResponse {
    /// Creates a response from a status and body.
    #[must_use]
    pub fn new(status: ResponseStatus, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// Returns the status line.
    #[must_use]
    pub fn status(&self) -> &ResponseStatus {
        &self.status
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Returns true if the device answered 200.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Parses the body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be deserialized into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        T::deserialize(&self.body).map_err(Into::into)
    }
}

/// Body of a relay state write.
///
/// Serializes as `{"isOn": true, "latch": 7000}` when switching on and as
/// `{"isOn": false}` when switching off.
///
/// # Examples
///
/// ```
/// use circuit_sync::protocol::StateWrite;
///
/// let on = serde_json::to_value(StateWrite::new(true)).unwrap();
/// assert_eq!(on, serde_json::json!({ "isOn": true, "latch": 7000 }));
///
/// let off = serde_json::to_value(StateWrite::new(false)).unwrap();
/// assert_eq!(off, serde_json::json!({ "isOn": false }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateWrite {
    is_on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    latch: Option<u64>,
}

impl StateWrite {
    /// Hold-open window sent with every "on" command, in milliseconds.
    pub const LATCH_MS: u64 = 7000;

    /// Creates the write body for the desired state.
    #[must_use]
    pub fn new(desired: bool) -> Self {
        Self {
            is_on: desired,
            latch: desired.then_some(Self::LATCH_MS),
        }
    }

    /// Returns the requested state.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the latch duration, present only for "on" writes.
    #[must_use]
    pub fn latch(&self) -> Option<u64> {
        self.latch
    }

    /// Serializes the write into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_body(&self) -> Result<serde_json::Value, ParseError> {
        serde_json::to_value(self).map_err(Into::into)
    }
}

/// Trait for services that can reach device endpoints.
///
/// The returned futures are `Send` so equipment can be driven from spawned
/// tasks (the poll timer, concurrent status validation).
pub trait DeviceService: Send + Sync + 'static {
    /// Reads `path` on the endpoint registered as `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the endpoint is unknown or unreachable.
    fn get(
        &self,
        connection_id: &str,
        path: &str,
    ) -> impl Future<Output = Result<DeviceResponse, ProtocolError>> + Send;

    /// Writes `body` to `path` on the endpoint registered as `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the endpoint is unknown or unreachable.
    fn put(
        &self,
        connection_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<DeviceResponse, ProtocolError>> + Send;
}
