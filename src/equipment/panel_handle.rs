// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Non-owning handle to the control panel.

use std::fmt;
use std::sync::Arc;

use crate::error::ProtocolError;
use crate::protocol::{DeviceResponse, DeviceService};
use crate::types::PanelId;

/// Handle a unit uses to reach its control panel.
///
/// It carries the panel's identity for log context and a shared reference to
/// the device service. It does not own the panel or any collection, so units
/// holding it never keep their owner alive.
pub struct PanelHandle<S> {
    id: PanelId,
    name: Arc<str>,
    service: Arc<S>,
}

impl<S> PanelHandle<S> {
    /// Creates a handle for a new panel.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, service: Arc<S>) -> Self {
        Self::with_id(PanelId::new(), name, service)
    }

    /// Creates a handle for an existing panel id.
    #[must_use]
    pub fn with_id(id: PanelId, name: impl Into<Arc<str>>, service: Arc<S>) -> Self {
        Self {
            id,
            name: name.into(),
            service,
        }
    }

    /// Returns the panel id.
    #[must_use]
    pub fn id(&self) -> PanelId {
        self.id
    }

    /// Returns the panel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device service.
    #[must_use]
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }
}

impl<S: DeviceService> PanelHandle<S> {
    /// Reads `path` on a connection through the panel's device service.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the device could not be reached.
    pub async fn get(&self, connection_id: &str, path: &str) -> Result<DeviceResponse, ProtocolError> {
        let result = self.service.get(connection_id, path).await;
        if let Err(e) = &result {
            tracing::debug!(panel = %self.name, connection_id, path, error = %e, "Device read failed");
        }
        result
    }

    /// Writes `body` to `path` on a connection through the panel's device service.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the device could not be reached.
    pub async fn put(
        &self,
        connection_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DeviceResponse, ProtocolError> {
        let result = self.service.put(connection_id, path, body).await;
        if let Err(e) = &result {
            tracing::debug!(panel = %self.name, connection_id, path, error = %e, "Device write failed");
        }
        result
    }
}

impl<S> Clone for PanelHandle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> fmt::Debug for PanelHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::scripted::{Reply, ScriptedDeviceService};

    #[test]
    fn clones_share_identity_and_service() {
        let handle = PanelHandle::new("pool", Arc::new(ScriptedDeviceService::new()));
        let clone = handle.clone();

        assert_eq!(handle.id(), clone.id());
        assert_eq!(clone.name(), "pool");
        assert!(Arc::ptr_eq(handle.service(), clone.service()));
    }

    #[test]
    fn debug_shows_name() {
        let handle = PanelHandle::new("spa", Arc::new(ScriptedDeviceService::new()));
        assert!(format!("{handle:?}").contains("spa"));
    }

    #[tokio::test]
    async fn delegates_to_service() {
        let service = Arc::new(ScriptedDeviceService::new());
        service.reply("/status/device/b2", Reply::Unreachable);
        let handle = PanelHandle::new("pool", Arc::clone(&service));

        assert!(handle.get("c1", "/status/device/b1").await.is_ok());
        assert!(handle.get("c1", "/status/device/b2").await.is_err());

        let body = serde_json::json!({ "isOn": false });
        assert!(handle.put("c1", "/state/device/b1", &body).await.is_ok());

        let requests = service.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].method, "PUT");
        assert_eq!(requests[2].body, Some(body));
    }
}
