// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `circuit_sync` - keeps equipment circuits in sync with smart relays.
//!
//! This library reconciles the desired state of switchable equipment outputs
//! (pumps, lights, valves) with network-attached smart-relay devices. It
//! runs inside an automation controller and covers the device-binding layer
//! only: configuration storage, the command surface and logging setup are
//! left to the embedding application.
//!
//! # Features
//!
//! - **Confirmed writes**: a bound circuit commits a state change only after
//!   its relay answered 200; virtual circuits commit locally
//! - **Fault polling**: every collection revalidates its units on a
//!   recurring, cancellable timer; one failing unit never stops the others
//! - **Generic collections**: any [`Equipment`](equipment::Equipment) kind
//!   can be managed by an [`EquipmentCollection`]
//! - **Event system**: state changes are broadcast as [`StateEvent`]s
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use circuit_sync::{CollectionOptions, ControlPanel};
//! use circuit_sync::equipment::CircuitConfig;
//! use circuit_sync::protocol::{ConnectionConfig, HttpDeviceService};
//! use circuit_sync::types::EquipmentId;
//!
//! #[tokio::main]
//! async fn main() -> circuit_sync::Result<()> {
//!     let service = HttpDeviceService::new()?
//!         .with_connection("c1", &ConnectionConfig::new("192.168.1.50"))?;
//!     let panel = ControlPanel::new("pool", Arc::new(service), CollectionOptions::default());
//!
//!     panel
//!         .start([
//!             CircuitConfig::new(3, "Pool Light").as_master(),
//!             CircuitConfig::new(5, "Filter Pump").as_master().with_binding("c1", "b1"),
//!         ])
//!         .await;
//!
//!     let outcome = panel.set_circuit_state(EquipmentId::new(5), true).await?;
//!     if !outcome.is_committed() {
//!         println!("relay refused: {:?}", outcome.response());
//!     }
//!
//!     panel.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.

pub mod collection;
pub mod config;
pub mod equipment;
pub mod error;
pub mod event;
mod panel;
pub mod protocol;
pub mod state;
pub mod types;

pub use collection::{CollectionOptions, EquipmentCollection};
pub use config::PanelConfig;
pub use equipment::{Circuit, CircuitConfig, StateOutcome};
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{EventBus, StateEvent};
pub use panel::ControlPanel;
#[cfg(feature = "http")]
pub use protocol::HttpDeviceService;
pub use protocol::{ConnectionConfig, DeviceService};
pub use state::{LiveState, LiveStateStore};
pub use types::{CommStatus, DeviceBinding, EquipmentId, PanelId};
