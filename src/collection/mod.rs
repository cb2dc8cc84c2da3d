// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Equipment collections and their recurring poll.
//!
//! An [`EquipmentCollection`] is generic over any [`Equipment`] kind. Besides
//! lookup and lifecycle operations it owns a [`PollTimer`] that runs a
//! revalidation pass over all units every
//! [`polling_interval`](CollectionOptions::polling_interval):
//!
//! ```text
//! start_polling ──► wait interval ──► poll_tick ──► validate_all ──┐
//!                        ▲                                        │
//!                        └──────────── re-arm ◄───────────────────┘
//! ```
//!
//! Passes never overlap: the next one is armed only after the current one
//! has finished. [`close_all`](EquipmentCollection::close_all) cancels the
//! poll before closing any unit.
//!
//! [`Equipment`]: crate::equipment::Equipment

mod equipment_collection;
mod options;
mod poll_timer;

pub use equipment_collection::EquipmentCollection;
pub use options::{CollectionOptions, DEFAULT_POLLING_INTERVAL};
pub use poll_timer::PollTimer;
