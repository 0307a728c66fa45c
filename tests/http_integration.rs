// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP transport using wiremock.

#![cfg(feature = "http")]

use std::time::Duration;

use touch_relay::protocol::{HttpTransport, Transport};
use touch_relay::sensing::{SimulatedPanel, SimulatedSensors};
use touch_relay::{Pipeline, PipelineConfig, TransportError};
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// HttpTransport Tests
// ============================================================================

mod http_transport {
    use super::*;

    #[tokio::test]
    async fn posts_json_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/touch"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"button_0": "1"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(format!("{}/touch", mock_server.uri())).unwrap();
        transport.publish(br#"{"button_0":"1"}"#).await.unwrap();
    }

    #[tokio::test]
    async fn sends_basic_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(basic_auth("admin", "secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::builder()
            .endpoint(mock_server.uri())
            .credentials("admin", "secret")
            .build()
            .unwrap();

        transport.publish(b"{}").await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(mock_server.uri()).unwrap();
        let err = transport.publish(b"{}").await.unwrap_err();

        match err {
            TransportError::Rejected(message) => assert!(message.contains("503")),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::builder()
            .endpoint(mock_server.uri())
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let err = transport.publish(b"{}").await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(100)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        let transport = HttpTransport::builder()
            .endpoint("http://127.0.0.1:9/touch")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert!(transport.publish(b"{}").await.is_err());
    }
}

// ============================================================================
// Pipeline over HTTP
// ============================================================================

mod pipeline_http {
    use super::*;

    #[tokio::test]
    async fn press_is_posted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/touch"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let panel = SimulatedPanel::new();
        let config = PipelineConfig::default()
            .with_scan_period(Duration::from_millis(10))
            .with_publish_period(Duration::from_millis(200));

        let handle = Pipeline::builder(config)
            .source(SimulatedSensors::new(panel.clone()))
            .transport(HttpTransport::new(format!("{}/touch", mock_server.uri())).unwrap())
            .start()
            .unwrap();

        // Let the first scan establish the baseline.
        tokio::time::sleep(Duration::from_millis(50)).await;
        panel.press(1);
        tokio::time::sleep(Duration::from_millis(400)).await;

        handle.shutdown().await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"button_1": "1"}));
    }
}
