// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT transport using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::time::sleep;
use touch_relay::protocol::{MqttTransport, QoS, Transport};
use touch_relay::sensing::{SimulatedPanel, SimulatedSensors};
use touch_relay::{Pipeline, PipelineConfig, TransportError};

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind and accept connections
    sleep(Duration::from_millis(500)).await;
}

// ============================================================================
// Connection Tests
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_with_builder() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .client_id("touch-relay-test")
            .build()
            .await
            .unwrap();

        assert!(transport.is_connected());
        assert_eq!(transport.topic(), "panel/touch");
        assert_eq!(transport.client_id(), "touch-relay-test");
    }

    #[tokio::test]
    async fn connect_with_mqtt_url() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::from_url(&format!("mqtt://127.0.0.1:{port}"))
            .unwrap()
            .topic("panel/touch")
            .build()
            .await
            .unwrap();

        assert_eq!(transport.port(), port);
        assert!(transport.client_id().starts_with("touch_relay_"));
    }

    #[tokio::test]
    async fn connect_with_tcp_scheme() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttTransport::from_url(&format!("tcp://127.0.0.1:{port}"))
            .unwrap()
            .topic("panel/touch")
            .build()
            .await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
    }

    #[tokio::test]
    async fn connect_without_broker_fails() {
        let port = get_test_port();

        let result = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .connection_timeout(Duration::from_secs(2))
            .build()
            .await;

        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }
}

// ============================================================================
// Publish Tests
// ============================================================================

mod publish {
    use super::*;

    #[tokio::test]
    async fn publish_while_connected() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .build()
            .await
            .unwrap();

        transport
            .publish(br#"{"button_0":"1","slider_0":"42"}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn publish_with_at_least_once() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .qos(QoS::AtLeastOnce)
            .build()
            .await
            .unwrap();

        transport.publish(br#"{"button_1":"0"}"#).await.unwrap();
    }

    #[tokio::test]
    async fn publish_after_disconnect_fails_fast() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .build()
            .await
            .unwrap();

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());

        let err = transport.publish(b"{}").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }
}

// ============================================================================
// Pipeline over MQTT
// ============================================================================

mod pipeline_mqtt {
    use super::*;

    #[tokio::test]
    async fn pipeline_runs_against_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .topic("panel/touch")
            .build()
            .await
            .unwrap();

        let panel = SimulatedPanel::new();
        let config = PipelineConfig::default()
            .with_scan_period(Duration::from_millis(10))
            .with_publish_period(Duration::from_millis(100));

        let handle = Pipeline::builder(config)
            .source(SimulatedSensors::new(panel.clone()))
            .transport(transport.clone())
            .start()
            .unwrap();

        sleep(Duration::from_millis(30)).await;
        panel.press(0);
        sleep(Duration::from_millis(250)).await;

        assert!(handle.buffer().is_empty());
        handle.shutdown().await.unwrap();
        assert!(transport.is_connected());
    }
}
