// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Published equipment state.
//!
//! [`LiveState`] is the externally observable state of one unit: whether it
//! is on and whether its device is healthy. A [`LiveStateStore`] holds it per
//! equipment id. Only the owning unit writes to its entry; everyone else
//! reads it or subscribes to the store's events.
//!
//! # Examples
//!
//! ```
//! use circuit_sync::state::LiveStateStore;
//! use circuit_sync::types::{CommStatus, EquipmentId};
//!
//! let store = LiveStateStore::new();
//! let id = EquipmentId::new(5);
//!
//! // Unknown ids read as off and healthy
//! assert!(!store.get(id).is_on());
//!
//! // `set_on` returns true if the state actually changed
//! assert!(store.set_on(id, true));
//! assert!(!store.set_on(id, true));
//!
//! store.set_comm_status(id, CommStatus::Fault);
//! assert_eq!(store.get(id).comm_status(), CommStatus::Fault);
//! ```

mod live_state;
mod store;

pub use live_state::LiveState;
pub use store::LiveStateStore;
