// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for published equipment state.
//!
//! Every actual change to a [`LiveStateStore`](crate::state::LiveStateStore)
//! is broadcast as a [`StateEvent`], along with membership changes of the
//! collection owning the store. The [`EventBus`] uses tokio's broadcast
//! channel so any number of subscribers (a command surface, a UI bridge)
//! can follow along.
//!
//! # Examples
//!
//! ```
//! use circuit_sync::event::{EventBus, StateEvent};
//! use circuit_sync::types::EquipmentId;
//!
//! let bus = EventBus::new();
//!
//! // Subscribe to events
//! let mut rx = bus.subscribe();
//!
//! // Publish an event
//! bus.publish(StateEvent::power_changed(EquipmentId::new(5), true));
//! ```

mod event_bus;
mod state_event;

pub use event_bus::EventBus;
pub use state_event::StateEvent;
