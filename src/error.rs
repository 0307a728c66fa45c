// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `touch_relay` library.
//!
//! The hierarchy mirrors the stages of the pipeline: sensing hardware faults,
//! transport failures, invalid configuration and payload serialization.
//!
//! Only [`SensorError`] and [`ConfigError`] are fatal, and only at startup.
//! A [`TransportError`] observed by the publish task drops the current batch
//! and is otherwise absorbed; an empty drain is never an error.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The sensing hardware failed.
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// The transport failed to deliver a payload.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A batch could not be serialized.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// A background task terminated abnormally.
    #[error("task failed: {0}")]
    Task(String),
}

/// Errors raised by a [`SensorSource`](crate::sensing::SensorSource).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The sensing subsystem could not be initialized.
    #[error("sensing hardware initialization failed: {0}")]
    InitFailed(String),

    /// A configured sensor does not exist on the hardware.
    #[error("unknown sensor: {0}")]
    UnknownSensor(String),
}

/// Errors related to delivering payloads to the remote endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT client rejected the request.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the endpoint failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The link is currently down.
    #[error("transport is not connected")]
    NotConnected,

    /// The endpoint answered but refused the payload.
    #[error("payload rejected: {0}")]
    Rejected(String),

    /// Operation timed out.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A period must be strictly positive.
    #[error("{name} period must be greater than zero")]
    ZeroPeriod {
        /// Which period was invalid (`scan` or `publish`).
        name: &'static str,
    },

    /// No sensors were configured.
    #[error("sensor layout is empty")]
    EmptyLayout,

    /// The same sensor was configured twice.
    #[error("sensor {0} is configured more than once")]
    DuplicateSensor(String),

    /// Two sensors share a payload label.
    #[error("label {0:?} is used by more than one sensor")]
    DuplicateLabel(String),

    /// A sensor label is empty.
    #[error("sensor {0} has an empty label")]
    EmptyLabel(String),

    /// A sensor identifier could not be parsed.
    #[error("invalid sensor id {0:?}: expected button_<n> or slider_<n>")]
    InvalidSensorId(String),

    /// The configuration document could not be read.
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Errors raised while serializing a batch.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// JSON encoding failed.
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
