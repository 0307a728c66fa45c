// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration.
//!
//! Configuration is loaded once at startup and is immutable afterwards. It can
//! be built in code or read from a JSON document:
//!
//! ```
//! use touch_relay::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(
//!     r#"{
//!         "scan_period_ms": 20,
//!         "publish_period_ms": 2000,
//!         "sensors": [
//!             { "id": "button_0", "label": "play" },
//!             { "id": "slider_0" }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.layout().len(), 2);
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::SensorId;

/// One configured sensor and the key it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEntry {
    /// The hardware sensor.
    pub id: SensorId,
    /// Payload key for this sensor.
    pub label: String,
}

/// Ordered mapping from sensor identifiers to payload labels.
///
/// Scans read sensors in layout order.
///
/// # Examples
///
/// ```
/// use touch_relay::config::SensorLayout;
/// use touch_relay::types::SensorId;
///
/// let layout = SensorLayout::new()
///     .with_button(0)
///     .with_labeled(SensorId::Slider(0), "volume");
///
/// assert_eq!(layout.label(SensorId::Button(0)), Some("button_0"));
/// assert_eq!(layout.label(SensorId::Slider(0)), Some("volume"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorLayout {
    entries: Vec<SensorEntry>,
}

impl SensorLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a button published under its canonical name.
    #[must_use]
    pub fn with_button(self, index: u8) -> Self {
        let id = SensorId::Button(index);
        self.with_labeled(id, id.to_string())
    }

    /// Adds a slider published under its canonical name.
    #[must_use]
    pub fn with_slider(self, index: u8) -> Self {
        let id = SensorId::Slider(index);
        self.with_labeled(id, id.to_string())
    }

    /// Adds a sensor with a custom payload label.
    #[must_use]
    pub fn with_labeled(mut self, id: SensorId, label: impl Into<String>) -> Self {
        self.entries.push(SensorEntry {
            id,
            label: label.into(),
        });
        self
    }

    /// Returns the payload label of a sensor.
    #[must_use]
    pub fn label(&self, id: SensorId) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.label.as_str())
    }

    /// Iterates over configured sensors in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorEntry> {
        self.entries.iter()
    }

    /// Returns the number of configured sensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no sensor is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that the layout is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the layout is empty, or if a sensor or a label
    /// appears twice, or if a label is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }

        let mut ids = HashSet::new();
        let mut labels = HashSet::new();
        for entry in &self.entries {
            if !ids.insert(entry.id) {
                return Err(ConfigError::DuplicateSensor(entry.id.to_string()));
            }
            if entry.label.is_empty() {
                return Err(ConfigError::EmptyLabel(entry.id.to_string()));
            }
            if !labels.insert(entry.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(entry.label.clone()));
            }
        }
        Ok(())
    }

    /// The reference board: two buttons and one slider.
    #[must_use]
    pub fn reference_board() -> Self {
        Self::new().with_button(0).with_button(1).with_slider(0)
    }
}

/// Timing and sensor configuration for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    scan_period: Duration,
    publish_period: Duration,
    layout: SensorLayout,
}

impl PipelineConfig {
    /// Default scan period.
    pub const DEFAULT_SCAN_PERIOD: Duration = Duration::from_millis(20);
    /// Default publish period.
    pub const DEFAULT_PUBLISH_PERIOD: Duration = Duration::from_millis(2000);

    /// Creates a configuration with default periods for the given layout.
    #[must_use]
    pub fn new(layout: SensorLayout) -> Self {
        Self {
            scan_period: Self::DEFAULT_SCAN_PERIOD,
            publish_period: Self::DEFAULT_PUBLISH_PERIOD,
            layout,
        }
    }

    /// Sets the scan period.
    #[must_use]
    pub fn with_scan_period(mut self, period: Duration) -> Self {
        self.scan_period = period;
        self
    }

    /// Sets the publish period.
    #[must_use]
    pub fn with_publish_period(mut self, period: Duration) -> Self {
        self.publish_period = period;
        self
    }

    /// Returns the scan period.
    #[must_use]
    pub fn scan_period(&self) -> Duration {
        self.scan_period
    }

    /// Returns the publish period.
    #[must_use]
    pub fn publish_period(&self) -> Duration {
        self.publish_period
    }

    /// Returns the sensor layout.
    #[must_use]
    pub fn layout(&self) -> &SensorLayout {
        &self.layout
    }

    /// Checks the configuration.
    ///
    /// A publish period shorter than the scan period is accepted but logged,
    /// since batches will then mostly be empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a period is zero or the layout is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_period.is_zero() {
            return Err(ConfigError::ZeroPeriod { name: "scan" });
        }
        if self.publish_period.is_zero() {
            return Err(ConfigError::ZeroPeriod { name: "publish" });
        }
        if self.publish_period < self.scan_period {
            tracing::warn!(
                scan_ms = self.scan_period.as_millis(),
                publish_ms = self.publish_period.as_millis(),
                "Publish period is shorter than scan period"
            );
        }
        self.layout.validate()
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// Every field is optional; missing fields take their defaults. A sensor
    /// without a `label` is published under its canonical name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Malformed` if the document cannot be parsed, or
    /// any validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        let layout = match raw.sensors {
            Some(sensors) => sensors.into_iter().fold(SensorLayout::new(), |layout, s| {
                let label = s.label.unwrap_or_else(|| s.id.to_string());
                layout.with_labeled(s.id, label)
            }),
            None => SensorLayout::reference_board(),
        };

        let mut config = Self::new(layout);
        if let Some(ms) = raw.scan_period_ms {
            config.scan_period = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.publish_period_ms {
            config.publish_period = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(SensorLayout::reference_board())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    scan_period_ms: Option<u64>,
    publish_period_ms: Option<u64>,
    sensors: Option<Vec<RawSensor>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSensor {
    id: SensorId,
    label: Option<String>,
}
