// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status sink trait and event type.

use crate::types::{SensorId, SensorReading};

/// Observer of pipeline activity, typically an on-device display or LED.
///
/// Calls are made from the scan task (`notify_active`,
/// `notify_sensor_change`) and from the publish task (`notify_published`,
/// `notify_publish_failed`). Implementations must return quickly and must not
/// call back into the pipeline.
pub trait StatusSink: Send + Sync {
    /// Reports whether any sensor is currently touched. Called once per scan.
    fn notify_active(&self, active: bool);

    /// Reports a sensor transition.
    fn notify_sensor_change(&self, id: SensorId, reading: &SensorReading);

    /// Reports that a batch of `entries` values was handed to the transport.
    fn notify_published(&self, entries: usize) {
        let _ = entries;
    }

    /// Reports that a batch was dropped because the transport failed.
    fn notify_publish_failed(&self, error: &str) {
        let _ = error;
    }
}

/// Status notifications as broadcast by [`StatusBus`](super::StatusBus).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The overall activity indicator changed.
    ActiveChanged {
        /// Whether any sensor is touched.
        active: bool,
    },

    /// A sensor changed state.
    SensorChanged {
        /// The sensor that changed.
        id: SensorId,
        /// Its new reading.
        reading: SensorReading,
    },

    /// A batch was published.
    Published {
        /// Number of values in the batch.
        entries: usize,
    },

    /// A batch was dropped after a transport failure.
    PublishFailed {
        /// Description of the failure.
        error: String,
    },
}

impl StatusEvent {
    /// Returns `true` for publish-related events.
    #[must_use]
    pub fn is_publish(&self) -> bool {
        matches!(self, Self::Published { .. } | Self::PublishFailed { .. })
    }
}
