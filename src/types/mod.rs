// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the pipeline.
//!
//! # Types
//!
//! - [`SensorId`] - Stable identifier of a button or slider
//! - [`SensorReading`] - Typed per-cycle value of a sensor

mod reading;
mod sensor_id;

pub use reading::SensorReading;
pub use sensor_id::SensorId;
