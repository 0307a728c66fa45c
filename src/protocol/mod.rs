// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload encoding and transports.
//!
//! A drained [`Batch`] is serialized by [`encode_payload`] into a flat JSON
//! object mapping each sensor label to its string-encoded value:
//!
//! ```json
//! {"button_0":"1","slider_0":"42"}
//! ```
//!
//! The payload is then handed to a [`Transport`].
//!
//! # Transports
//!
//! - [`MqttTransport`]: publishes to a topic on an MQTT broker
//! - [`HttpTransport`]: POSTs to an HTTP endpoint
//! - [`MemoryTransport`]: records payloads in memory

#[cfg(feature = "http")]
mod http;
mod memory;
#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportBuilder};
pub use memory::MemoryTransport;
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttTransport, MqttTransportBuilder};
#[cfg(feature = "mqtt")]
pub use rumqttc::QoS;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::config::SensorLayout;
use crate::error::{PayloadError, TransportError};
use crate::state::Batch;

/// Delivers serialized batches to a remote endpoint.
///
/// `publish` is awaited by the publish task only, never while the aggregation
/// buffer is locked. The transport owns its connection lifecycle; the caller
/// never retries a failed payload.
pub trait Transport: Send + Sync {
    /// Sends one payload.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the payload could not be handed to the
    /// endpoint.
    fn publish(&self, payload: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn publish(&self, payload: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).publish(payload)
    }
}

/// Serializes a batch into a flat JSON object keyed by sensor label.
///
/// Keys are emitted in sorted order. Sensors missing from the layout are keyed
/// by their canonical name.
///
/// # Errors
///
/// Returns `PayloadError` if JSON encoding fails.
///
/// # Examples
///
/// ```
/// use touch_relay::config::SensorLayout;
/// use touch_relay::protocol::encode_payload;
/// use touch_relay::state::Batch;
/// use touch_relay::types::SensorId;
///
/// let batch: Batch = [
///     (SensorId::Slider(0), "42".to_string()),
///     (SensorId::Button(0), "1".to_string()),
/// ]
/// .into_iter()
/// .collect();
///
/// let payload = encode_payload(&batch, &SensorLayout::reference_board()).unwrap();
/// assert_eq!(payload, br#"{"button_0":"1","slider_0":"42"}"#);
/// ```
pub fn encode_payload(batch: &Batch, layout: &SensorLayout) -> Result<Vec<u8>, PayloadError> {
    let object: BTreeMap<String, &str> = batch
        .iter()
        .map(|(id, value)| {
            let key = layout
                .label(id)
                .map_or_else(|| id.to_string(), str::to_string);
            (key, value)
        })
        .collect();

    serde_json::to_vec(&object).map_err(PayloadError::from)
}

/// Parses a `scheme://host:port` style broker or endpoint address.
///
/// The scheme, when present, must be one of `schemes`. Returns the host and
/// the port, falling back to `default_port`.
pub(crate) fn parse_host_port(
    url: &str,
    schemes: &[&str],
    default_port: u16,
) -> Result<(String, u16), TransportError> {
    let rest = match url.split_once("://") {
        Some((scheme, rest)) if schemes.contains(&scheme) => rest,
        Some((scheme, _)) => {
            return Err(TransportError::InvalidAddress(format!(
                "unsupported scheme: {scheme}"
            )));
        }
        None => url,
    };

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| TransportError::InvalidAddress(format!("invalid port: {port}")))?;
            (host, port)
        }
        None => (rest, default_port),
    };

    if host.is_empty() {
        return Err(TransportError::InvalidAddress(format!("missing host in {url:?}")));
    }

    Ok((host.to_string(), port))
}
