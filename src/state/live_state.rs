// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live state of one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CommStatus;

/// Published state of one equipment unit.
///
/// The default state is off, healthy and never checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveState {
    is_on: bool,
    comm_status: CommStatus,
    last_checked: Option<DateTime<Utc>>,
}

impl LiveState {
    /// Creates the default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the output is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the communication status.
    #[must_use]
    pub fn comm_status(&self) -> CommStatus {
        self.comm_status
    }

    /// Returns when the communication status was last validated.
    #[must_use]
    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Sets the on/off state.
    ///
    /// Returns true if the state changed.
    pub fn set_on(&mut self, is_on: bool) -> bool {
        let changed = self.is_on != is_on;
        self.is_on = is_on;
        changed
    }

    /// Records a validation outcome checked at `at`.
    ///
    /// Returns true if the status changed. The check time is updated either
    /// way.
    pub fn set_comm_status(&mut self, status: CommStatus, at: DateTime<Utc>) -> bool {
        let changed = self.comm_status != status;
        self.comm_status = status;
        self.last_checked = Some(at);
        changed
    }
}
