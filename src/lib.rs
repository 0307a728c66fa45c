// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `touch_relay` - Relay capacitive touch sensor changes to a remote endpoint.
//!
//! The library scans a capacitive sensing controller on a short fixed period,
//! turns successive scans into per-sensor changes, coalesces those changes and
//! publishes them as a flat JSON object on a longer period over MQTT or HTTP.
//!
//! # Architecture
//!
//! - **Scan task** ([`scheduler::ScanScheduler`]): every 20 ms by default,
//!   requests a scan from the [`sensing::SensorSource`], waits for the
//!   end-of-scan signal, diffs the result and merges changed values into the
//!   aggregation buffer.
//! - **Publish task** ([`scheduler::PublishScheduler`]): every 2 s by default,
//!   drains the buffer and hands the batch to a [`protocol::Transport`]. A
//!   failed batch is dropped.
//! - **Status sink** ([`event::StatusSink`]): optional observer of activity
//!   and publish results, such as an on-board display.
//!
//! Only the latest value of each sensor survives between two publishes, and
//! only sensors that changed are published.
//!
//! # Quick Start
//!
//! ```no_run
//! use touch_relay::{Pipeline, PipelineConfig};
//! use touch_relay::protocol::HttpTransport;
//! use touch_relay::sensing::{SimulatedPanel, SimulatedSensors};
//!
//! #[tokio::main]
//! async fn main() -> touch_relay::Result<()> {
//!     let panel = SimulatedPanel::new();
//!
//!     let handle = Pipeline::builder(PipelineConfig::default())
//!         .source(SimulatedSensors::new(panel.clone()))
//!         .transport(HttpTransport::new("http://192.168.1.20:8080/touch")?)
//!         .start()?;
//!
//!     panel.press(0);
//!     panel.touch_slider(0, 42);
//!
//!     // {"button_0":"1","slider_0":"42"} is posted within two seconds.
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     handle.shutdown().await
//! }
//! ```
//!
//! # Payload
//!
//! ```json
//! {"button_0":"1","slider_0":"42"}
//! ```
//!
//! Keys are the labels configured in the [`config::SensorLayout`]. Buttons
//! encode as `"0"`/`"1"`, sliders as their decimal position.
//!
//! # Features
//!
//! - `mqtt` (default): [`protocol::MqttTransport`] via `rumqttc`
//! - `http` (default): [`protocol::HttpTransport`] via `reqwest`

pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod protocol;
pub mod scheduler;
pub mod sensing;
pub mod state;
pub mod types;

pub use config::{PipelineConfig, SensorLayout};
pub use error::{ConfigError, Error, PayloadError, Result, SensorError, TransportError};
pub use event::{StatusBus, StatusEvent, StatusSink};
pub use pipeline::{Pipeline, PipelineHandle};
pub use protocol::Transport;
pub use sensing::{ScanCompleteHandle, SensorSource};
pub use state::{AggregationBuffer, Batch};
pub use types::{SensorId, SensorReading};
