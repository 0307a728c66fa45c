// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Identifier of a physical touch sensor.
///
/// Identifiers are assigned at configuration time and never change. The
/// canonical string form is `button_<n>` or `slider_<n>`, which is also the
/// default payload label of the sensor.
///
/// # Examples
///
/// ```
/// use touch_relay::types::SensorId;
///
/// let id: SensorId = "slider_0".parse().unwrap();
/// assert_eq!(id, SensorId::Slider(0));
/// assert_eq!(SensorId::Button(1).to_string(), "button_1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SensorId {
    /// A single-electrode button, by widget index.
    Button(u8),
    /// A linear slider, by widget index.
    Slider(u8),
}

impl SensorId {
    const BUTTON_PREFIX: &'static str = "button_";
    const SLIDER_PREFIX: &'static str = "slider_";

    /// Returns the hardware widget index.
    #[must_use]
    pub const fn index(&self) -> u8 {
        match self {
            Self::Button(index) | Self::Slider(index) => *index,
        }
    }

    /// Returns `true` for button sensors.
    #[must_use]
    pub const fn is_button(&self) -> bool {
        matches!(self, Self::Button(_))
    }

    /// Returns `true` for slider sensors.
    #[must_use]
    pub const fn is_slider(&self) -> bool {
        matches!(self, Self::Slider(_))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button(index) => write!(f, "{}{index}", Self::BUTTON_PREFIX),
            Self::Slider(index) => write!(f, "{}{index}", Self::SLIDER_PREFIX),
        }
    }
}

impl FromStr for SensorId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSensorId(s.to_string());

        let (constructor, digits): (fn(u8) -> Self, &str) =
            if let Some(rest) = s.strip_prefix(Self::BUTTON_PREFIX) {
                (Self::Button, rest)
            } else if let Some(rest) = s.strip_prefix(Self::SLIDER_PREFIX) {
                (Self::Slider, rest)
            } else {
                return Err(invalid());
            };

        // u8::from_str accepts a leading '+', which would break round-tripping.
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        digits.parse().map(constructor).map_err(|_| invalid())
    }
}

impl TryFrom<String> for SensorId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SensorId> for String {
    fn from(id: SensorId) -> Self {
        id.to_string()
    }
}
