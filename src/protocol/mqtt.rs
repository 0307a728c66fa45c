// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport.
//!
//! Publishes each payload to a single topic on an MQTT broker. The connection
//! is persistent: a background task drives the `rumqttc` event loop, tracks
//! whether the link is up, and keeps reconnecting after errors.
//!
//! # Examples
//!
//! ```no_run
//! use touch_relay::protocol::{MqttTransport, Transport};
//!
//! # async fn example() -> touch_relay::Result<()> {
//! let transport = MqttTransport::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .topic("panel/touch")
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! transport.publish(br#"{"button_0":"1"}"#).await?;
//! transport.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectionError, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;

use super::{Transport, parse_host_port};
use crate::error::TransportError;

const DEFAULT_PORT: u16 = 1883;

/// First delay before polling again after a connection error.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound for the reconnect delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Configuration for an MQTT transport.
#[derive(Debug, Clone)]
struct MqttTransportConfig {
    host: String,
    port: u16,
    topic: String,
    client_id: Option<String>,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    qos: QoS,
    retain: bool,
}

impl Default for MqttTransportConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            topic: String::new(),
            client_id: None,
            credentials: None,
            keep_alive: Duration::from_secs(600),
            connection_timeout: Duration::from_secs(10),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

/// Transport publishing payloads to an MQTT topic.
///
/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct MqttTransport {
    inner: Arc<MqttTransportInner>,
}

struct MqttTransportInner {
    client: AsyncClient,
    config: MqttTransportConfig,
    client_id: String,
    link: Arc<LinkState>,
}

/// Link flags shared with the event loop task.
///
/// The task does not hold the client, so dropping every transport clone ends
/// the event loop.
#[derive(Debug, Default)]
struct LinkState {
    connected: AtomicBool,
    closing: AtomicBool,
}

impl MqttTransport {
    /// Creates a new builder for configuring an MQTT transport.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::default()
    }

    /// Creates a builder from a broker URL such as `mqtt://broker:1883`.
    ///
    /// Accepts the `mqtt` and `tcp` schemes, or a bare `host[:port]`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidAddress` if the URL cannot be parsed.
    pub fn from_url(url: &str) -> Result<MqttTransportBuilder, TransportError> {
        let (host, port) = parse_host_port(url, &["mqtt", "tcp"], DEFAULT_PORT)?;
        Ok(MqttTransportBuilder::default().host(host).port(port))
    }

    /// Returns whether the broker link is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.link.connected.load(Ordering::Acquire)
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the topic payloads are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.inner.config.topic
    }

    /// Returns the MQTT client identifier in use.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.link.closing.store(true, Ordering::Release);
        self.inner
            .client
            .disconnect()
            .await
            .map_err(TransportError::Mqtt)?;

        self.inner.link.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl Transport for MqttTransport {
    async fn publish(&self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let config = &self.inner.config;
        self.inner
            .client
            .publish(&config.topic, config.qos, config.retain, payload.to_vec())
            .await
            .map_err(TransportError::Mqtt)?;

        tracing::debug!(topic = %config.topic, bytes = payload.len(), "MQTT payload queued");
        Ok(())
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("topic", &self.inner.config.topic)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for an [`MqttTransport`].
///
/// Defaults: port 1883, keep-alive 600 s, connection timeout 10 s, QoS
/// at-most-once, no retain, random client id.
#[derive(Debug, Default)]
pub struct MqttTransportBuilder {
    config: MqttTransportConfig,
}

impl MqttTransportBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the topic payloads are published to.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.config.topic = topic.into();
        self
    }

    /// Sets the MQTT client identifier (default: `touch_relay_` and a random
    /// suffix).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 600 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the delivery QoS (default: at most once).
    #[must_use]
    pub fn qos(mut self, qos: QoS) -> Self {
        self.config.qos = qos;
        self
    }

    /// Sets the retain flag on published messages (default: `false`).
    #[must_use]
    pub fn retain(mut self, retain: bool) -> Self {
        self.config.retain = retain;
        self
    }

    /// Builds the transport and connects to the broker.
    ///
    /// Waits for the broker's ConnAck before returning.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host or topic is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<MqttTransport, TransportError> {
        if self.config.host.is_empty() {
            return Err(TransportError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }
        if self.config.topic.is_empty() {
            return Err(TransportError::InvalidAddress(
                "MQTT topic is required".to_string(),
            ));
        }

        let client_id = self.config.client_id.clone().unwrap_or_else(|| {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("touch_relay_{}", &suffix[..8])
        });

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let transport = MqttTransport {
            inner: Arc::new(MqttTransportInner {
                client,
                config: self.config.clone(),
                client_id,
                link: Arc::new(LinkState::default()),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();

        let link = Arc::clone(&transport.inner.link);
        tokio::spawn(async move {
            drive_event_loop(event_loop, link, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    topic = %self.config.topic,
                    client_id = %transport.client_id(),
                    "Connected to MQTT broker"
                );
                Ok(transport)
            }
            Ok(Err(_)) => Err(TransportError::ConnectionFailed(
                "MQTT event loop terminated before the broker acknowledged the connection"
                    .to_string(),
            )),
            Err(_) => {
                // Stop the event loop; nobody will use this client.
                transport.inner.link.closing.store(true, Ordering::Release);
                let _ = transport.inner.client.try_disconnect();
                Err(TransportError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Drives the MQTT event loop for one transport.
///
/// Errors before the first ConnAck end the loop so that `build` fails. Later
/// errors mark the link down and the loop keeps polling, which makes
/// `rumqttc` reconnect, with an exponential back-off between attempts.
async fn drive_event_loop(
    mut event_loop: EventLoop,
    link: Arc<LinkState>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                link.connected.store(true, Ordering::Release);
                backoff = INITIAL_BACKOFF;
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker closed the connection");
                link.connected.store(false, Ordering::Release);
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                tracing::debug!("MQTT client dropped, stopping event loop");
                break;
            }
            Err(e) => {
                link.connected.store(false, Ordering::Release);

                if link.closing.load(Ordering::Acquire) {
                    tracing::debug!(error = %e, "MQTT event loop stopped");
                    break;
                }
                if connack_tx.is_some() {
                    tracing::error!(error = %e, "MQTT connection failed");
                    break;
                }

                tracing::warn!(
                    error = %e,
                    retry_in_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "MQTT connection lost, reconnecting"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}
