// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status reporting.
//!
//! The pipeline reports what it observes to an optional [`StatusSink`]. The
//! sink is purely observational: nothing it does feeds back into scanning or
//! publishing. [`StatusBus`] is a sink that rebroadcasts notifications as
//! [`StatusEvent`]s over a tokio broadcast channel.
//!
//! # Examples
//!
//! ```
//! use touch_relay::event::{StatusBus, StatusEvent, StatusSink};
//!
//! let bus = StatusBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.notify_published(2);
//! assert_eq!(rx.try_recv().unwrap(), StatusEvent::Published { entries: 2 });
//! ```

mod event_bus;
mod status;

pub use event_bus::StatusBus;
pub use status::{StatusEvent, StatusSink};
