// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-cycle sensor readings.

use std::fmt;

/// The value observed for one sensor during one scan cycle.
///
/// Readings stay typed inside the pipeline so that change detection compares
/// values, not their string encodings. They are converted to strings only when
/// handed to the aggregation buffer (see [`SensorReading::encode`]).
///
/// # Equality
///
/// Two untouched slider readings are always equal, whatever their position:
/// the hardware position is undefined while nothing touches the slider.
///
/// ```
/// use touch_relay::types::SensorReading;
///
/// assert_eq!(SensorReading::untouched(17), SensorReading::untouched(903));
/// assert_ne!(SensorReading::touched(17), SensorReading::untouched(17));
/// assert_ne!(SensorReading::touched(17), SensorReading::touched(18));
/// ```
#[derive(Debug, Clone, Copy, Eq)]
pub enum SensorReading {
    /// Activation state of a button.
    Digital(bool),
    /// Position of a slider, with an explicit touch flag.
    Position {
        /// Whether exactly one touch is present on the slider.
        touched: bool,
        /// Centroid reported by the hardware; meaningless while untouched.
        position: u32,
    },
}

impl SensorReading {
    /// Creates a reading for a touched slider.
    #[must_use]
    pub const fn touched(position: u32) -> Self {
        Self::Position {
            touched: true,
            position,
        }
    }

    /// Creates a reading for an untouched slider.
    #[must_use]
    pub const fn untouched(position: u32) -> Self {
        Self::Position {
            touched: false,
            position,
        }
    }

    /// Returns `true` if the sensor is currently being touched.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        match self {
            Self::Digital(active) => *active,
            Self::Position { touched, .. } => *touched,
        }
    }

    /// Returns the string form used in published payloads.
    ///
    /// Buttons encode as `"0"` or `"1"`, a touched slider as its decimal
    /// position. An untouched slider has no reportable value and returns
    /// `None`.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::Digital(active) => Some(if *active { "1" } else { "0" }.to_string()),
            Self::Position {
                touched: true,
                position,
            } => Some(position.to_string()),
            Self::Position { touched: false, .. } => None,
        }
    }
}

impl PartialEq for SensorReading {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Digital(a), Self::Digital(b)) => a == b,
            (
                Self::Position {
                    touched: a_touched,
                    position: a_pos,
                },
                Self::Position {
                    touched: b_touched,
                    position: b_pos,
                },
            ) => a_touched == b_touched && (!a_touched || a_pos == b_pos),
            _ => false,
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital(true) => write!(f, "active"),
            Self::Digital(false) => write!(f, "inactive"),
            Self::Position {
                touched: true,
                position,
            } => write!(f, "touched at {position}"),
            Self::Position { touched: false, .. } => write!(f, "released"),
        }
    }
}

impl From<bool> for SensorReading {
    fn from(value: bool) -> Self {
        Self::Digital(value)
    }
}
