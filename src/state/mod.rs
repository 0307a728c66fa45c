// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor state tracking.
//!
//! - [`TouchDiffer`] turns successive [`Snapshot`]s into [`SensorChange`]s and
//!   [`PendingUpdate`]s. It is owned by the scan task.
//! - [`AggregationBuffer`] accumulates pending updates until the publish task
//!   drains them as a [`Batch`]. It is the only state shared between tasks.

mod aggregation;
mod change;
mod differ;

pub use aggregation::{AggregationBuffer, Batch};
pub use change::{PendingUpdate, SensorChange};
pub use differ::{DiffOutcome, Snapshot, TouchDiffer};
