// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication status of a unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Last-known communication health of an equipment unit.
///
/// Virtual units are always [`CommStatus::Ok`]. Bound units move between the
/// two states only through status validation, and any uncertainty during a
/// check yields [`CommStatus::Fault`].
///
/// # Examples
///
/// ```
/// use circuit_sync::types::CommStatus;
///
/// assert_eq!(CommStatus::Ok.code(), 0);
/// assert_eq!(CommStatus::try_from(1).unwrap(), CommStatus::Fault);
/// assert!(CommStatus::try_from(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommStatus {
    /// The device answered its last status check cleanly.
    #[default]
    Ok,
    /// The last status check failed or reported a fault.
    Fault,
}

impl CommStatus {
    /// Returns the numeric code (`0` for ok, `1` for fault).
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Fault => 1,
        }
    }

    /// Returns true if the unit is faulted.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault)
    }

    /// Returns the status for a check outcome.
    #[must_use]
    pub const fn from_fault(has_fault: bool) -> Self {
        if has_fault { Self::Fault } else { Self::Ok }
    }
}

impl TryFrom<u8> for CommStatus {
    type Error = ValueError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Fault),
            other => Err(ValueError::InvalidCommStatus(other)),
        }
    }
}

impl fmt::Display for CommStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Fault => write!(f, "fault"),
        }
    }
}
