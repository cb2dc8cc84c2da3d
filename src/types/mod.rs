// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! # Types
//!
//! - [`EquipmentId`] - Integer identity of an equipment unit, unique within its kind
//! - [`CommStatus`] - Last-known communication health (`Ok` = 0, `Fault` = 1)
//! - [`DeviceBinding`] - The (connection id, device binding) pair addressing a relay
//! - [`PanelId`] - Identity of the control panel owning a set of collections

mod binding;
mod comm_status;
mod equipment_id;
mod panel_id;

pub use binding::DeviceBinding;
pub use comm_status::CommStatus;
pub use equipment_id::EquipmentId;
pub use panel_id::PanelId;
