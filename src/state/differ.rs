// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Touch state differ.
//!
//! The differ keeps the previously observed reading of every sensor and turns
//! each new [`Snapshot`] into the list of sensors whose reading changed. Only
//! transitions are reported: the very first observation of a sensor is stored
//! silently, and a sensor that keeps its reading never reports again.
//!
//! # Examples
//!
//! ```
//! use touch_relay::state::{Snapshot, TouchDiffer};
//! use touch_relay::types::{SensorId, SensorReading};
//!
//! let mut differ = TouchDiffer::new();
//! let button = SensorId::Button(0);
//!
//! let first = differ.diff(&Snapshot::from_iter([(button, SensorReading::Digital(false))]));
//! assert!(first.changes.is_empty());
//!
//! let second = differ.diff(&Snapshot::from_iter([(button, SensorReading::Digital(true))]));
//! assert_eq!(second.updates.len(), 1);
//! assert_eq!(second.updates[0].value, "1");
//! ```

use std::collections::HashMap;

use super::{PendingUpdate, SensorChange};
use crate::config::SensorLayout;
use crate::sensing::SensorSource;
use crate::types::{SensorId, SensorReading};

/// Readings of all configured sensors for one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    readings: Vec<(SensorId, SensorReading)>,
}

impl Snapshot {
    /// Reads every sensor of the layout from a processed scan.
    pub fn capture<S: SensorSource + ?Sized>(source: &S, layout: &SensorLayout) -> Self {
        layout
            .iter()
            .map(|entry| {
                let reading = match entry.id {
                    SensorId::Button(index) => {
                        SensorReading::Digital(source.is_sensor_active(index))
                    }
                    SensorId::Slider(index) => match source.slider_touch_info(index) {
                        Some(touch) if touch.is_touched() => SensorReading::touched(touch.position),
                        Some(touch) => SensorReading::untouched(touch.position),
                        None => SensorReading::untouched(0),
                    },
                };
                (entry.id, reading)
            })
            .collect()
    }

    /// Returns the reading of a sensor, if it is part of the snapshot.
    #[must_use]
    pub fn get(&self, id: SensorId) -> Option<SensorReading> {
        self.readings
            .iter()
            .find(|(sensor, _)| *sensor == id)
            .map(|(_, reading)| *reading)
    }

    /// Returns `true` if any sensor is currently touched.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.readings.iter().any(|(_, reading)| reading.is_active())
    }

    /// Iterates over readings in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &(SensorId, SensorReading)> {
        self.readings.iter()
    }

    /// Returns the number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns `true` if the snapshot holds no reading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl FromIterator<(SensorId, SensorReading)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (SensorId, SensorReading)>>(iter: T) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}

/// Result of diffing one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Every transition observed, including slider releases.
    pub changes: Vec<SensorChange>,
    /// Transitions with a reportable value, ready for the aggregation buffer.
    pub updates: Vec<PendingUpdate>,
    /// Whether any sensor is touched in the current snapshot.
    pub any_active: bool,
}

/// Compares successive snapshots and reports transitions.
///
/// Owns the previous-state table. It is meant to live inside the scan task and
/// is deliberately not shareable.
#[derive(Debug, Default)]
pub struct TouchDiffer {
    previous: HashMap<SensorId, SensorReading>,
}

impl TouchDiffer {
    /// Creates a differ with no sensor observed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored reading of a sensor, or `None` before its first
    /// observation.
    #[must_use]
    pub fn previous(&self, id: SensorId) -> Option<SensorReading> {
        self.previous.get(&id).copied()
    }

    /// Compares a snapshot to the stored readings and updates them.
    pub fn diff(&mut self, snapshot: &Snapshot) -> DiffOutcome {
        let mut outcome = DiffOutcome {
            any_active: snapshot.any_active(),
            ..DiffOutcome::default()
        };

        for &(id, current) in snapshot.iter() {
            let Some(previous) = self.previous.insert(id, current) else {
                continue;
            };
            if previous == current {
                // Keep the earlier untouched position rather than the noise.
                self.previous.insert(id, previous);
                continue;
            }

            let change = SensorChange {
                id,
                previous,
                current,
            };
            if let Some(update) = change.pending_update() {
                outcome.updates.push(update);
            }
            outcome.changes.push(change);
        }

        outcome
    }
}
