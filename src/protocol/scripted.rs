// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted device service used by unit tests.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::json;

use crate::error::ProtocolError;
use crate::protocol::{DeviceResponse, DeviceService, ResponseStatus};

/// What the scripted service answers for a path.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Answer with this status code and body.
    Status(u16, serde_json::Value),
    /// Fail as if the endpoint were unreachable.
    Unreachable,
}

/// One request seen by the scripted service.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub method: &'static str,
    pub connection_id: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// Device service answering from a per-path script.
///
/// Unscripted `GET`s report a healthy device and unscripted `PUT`s succeed.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDeviceService {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedDeviceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reply for every request on `path`.
    pub fn reply(&self, path: &str, reply: Reply) {
        self.replies.lock().insert(path.to_string(), reply);
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    fn answer(
        &self,
        request: Request,
        fallback: serde_json::Value,
    ) -> Result<DeviceResponse, ProtocolError> {
        let reply = self.replies.lock().get(&request.path).cloned();
        let connection_id = request.connection_id.clone();
        self.requests.lock().push(request);

        match reply {
            Some(Reply::Status(code, body)) => Ok(DeviceResponse::new(
                ResponseStatus::new(code, if code == 200 { "OK" } else { "Error" }),
                body,
            )),
            Some(Reply::Unreachable) => Err(ProtocolError::ConnectionFailed(format!(
                "{connection_id} unreachable"
            ))),
            None => Ok(DeviceResponse::new(ResponseStatus::new(200, "OK"), fallback)),
        }
    }
}

impl DeviceService for ScriptedDeviceService {
    async fn get(&self, connection_id: &str, path: &str) -> Result<DeviceResponse, ProtocolError> {
        let request = Request {
            method: "GET",
            connection_id: connection_id.to_string(),
            path: path.to_string(),
            body: None,
        };
        self.answer(request, json!({ "hasFault": false }))
    }

    async fn put(
        &self,
        connection_id: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DeviceResponse, ProtocolError> {
        let request = Request {
            method: "PUT",
            connection_id: connection_id.to_string(),
            path: path.to_string(),
            body: Some(body.clone()),
        };
        self.answer(request, json!({}))
    }
}
