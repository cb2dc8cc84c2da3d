// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Equipment identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Integer identity of an equipment unit.
///
/// Ids come from the external equipment configuration and are only unique
/// within one kind of equipment: circuit 5 and pump 5 are different units.
///
/// # Examples
///
/// ```
/// use circuit_sync::types::EquipmentId;
///
/// let id = EquipmentId::new(5);
/// assert_eq!(id.value(), 5);
/// assert_eq!(id.to_string(), "5");
/// assert_eq!("5".parse::<EquipmentId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(u32);

impl EquipmentId {
    /// Creates an equipment identifier from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EquipmentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EquipmentId> for u32 {
    fn from(id: EquipmentId) -> Self {
        id.0
    }
}

impl FromStr for EquipmentId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|e| ParseError::InvalidValue {
                field: "equipment id".to_string(),
                message: e.to_string(),
            })
    }
}
