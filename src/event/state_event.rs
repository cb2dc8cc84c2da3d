// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State event types.

use serde::{Deserialize, Serialize};

use crate::types::{CommStatus, EquipmentId};

/// Events published for one equipment collection.
///
/// State events are only emitted when a value actually changes, so a poll
/// that confirms an already-known status stays silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StateEvent {
    /// A unit joined the collection.
    EquipmentAdded {
        /// The id of the added unit.
        id: EquipmentId,
    },

    /// A unit left the collection.
    EquipmentRemoved {
        /// The id of the removed unit.
        id: EquipmentId,
    },

    /// The committed on/off state changed.
    PowerChanged {
        /// The id of the unit.
        id: EquipmentId,
        /// The new state.
        is_on: bool,
    },

    /// The communication status changed.
    CommStatusChanged {
        /// The id of the unit.
        id: EquipmentId,
        /// The new status.
        status: CommStatus,
    },
}

impl StateEvent {
    /// Returns the equipment id associated with this event.
    #[must_use]
    pub fn id(&self) -> EquipmentId {
        match self {
            Self::EquipmentAdded { id }
            | Self::EquipmentRemoved { id }
            | Self::PowerChanged { id, .. }
            | Self::CommStatusChanged { id, .. } => *id,
        }
    }

    /// Returns `true` if this is a membership event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::EquipmentAdded { .. } | Self::EquipmentRemoved { .. }
        )
    }

    /// Creates an added event.
    #[must_use]
    pub fn added(id: EquipmentId) -> Self {
        Self::EquipmentAdded { id }
    }

    /// Creates a removed event.
    #[must_use]
    pub fn removed(id: EquipmentId) -> Self {
        Self::EquipmentRemoved { id }
    }

    /// Creates a power change event.
    #[must_use]
    pub fn power_changed(id: EquipmentId, is_on: bool) -> Self {
        Self::PowerChanged { id, is_on }
    }

    /// Creates a communication status change event.
    #[must_use]
    pub fn comm_status_changed(id: EquipmentId, status: CommStatus) -> Self {
        Self::CommStatusChanged { id, status }
    }
}
