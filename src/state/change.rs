// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change representation.
//!
//! A [`SensorChange`] is a typed transition observed by the differ. Changes
//! whose new reading has a reportable value become a [`PendingUpdate`], the
//! string-encoded form merged into the aggregation buffer.

use crate::types::{SensorId, SensorReading};

/// A transition of one sensor between two consecutive scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorChange {
    /// The sensor that changed.
    pub id: SensorId,
    /// The reading stored before this scan.
    pub previous: SensorReading,
    /// The reading observed by this scan.
    pub current: SensorReading,
}

impl SensorChange {
    /// Converts the change into a buffer update.
    ///
    /// Returns `None` when the new reading has no reportable value, which is
    /// the case for a slider that has just been released.
    #[must_use]
    pub fn pending_update(&self) -> Option<PendingUpdate> {
        self.current.encode().map(|value| PendingUpdate {
            id: self.id,
            value,
        })
    }
}

/// A string-encoded value waiting to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    /// The sensor the value belongs to.
    pub id: SensorId,
    /// Encoded value, as it will appear in the payload.
    pub value: String,
}

impl PendingUpdate {
    /// Creates a pending update.
    #[must_use]
    pub fn new(id: SensorId, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}
