// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use super::Transport;
use crate::error::TransportError;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport POSTing each payload to an HTTP endpoint.
///
/// Every publish is an independent request with an `application/json` body.
/// Any response outside the 2xx range is reported as
/// [`TransportError::Rejected`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use touch_relay::protocol::{HttpTransport, Transport};
///
/// # async fn example() -> touch_relay::Result<()> {
/// let transport = HttpTransport::builder()
///     .endpoint("http://192.168.1.20:8080/touch")
///     .credentials("admin", "password")
///     .timeout(Duration::from_secs(5))
///     .build()?;
///
/// transport.publish(br#"{"button_0":"1"}"#).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    client: Client,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Creates a transport for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is invalid or the HTTP client cannot be
    /// created.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        Self::builder().endpoint(endpoint).build()
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns whether authentication is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

impl Transport for HttpTransport {
    async fn publish(&self, payload: &[u8]) -> Result<(), TransportError> {
        tracing::debug!(endpoint = %self.endpoint, bytes = payload.len(), "Posting payload");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec());

        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(
                    u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                )
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        Ok(())
    }
}

/// Builder for an [`HttpTransport`].
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    endpoint: Option<String>,
    credentials: Option<(String, String)>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Sets the endpoint URL.
    ///
    /// A bare `host[:port]/path` is prefixed with `http://`.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets HTTP basic authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the request timeout (default: 10 seconds).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is missing or uses a scheme other than
    /// `http`/`https`, or if client creation fails.
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.is_empty())
            .ok_or_else(|| TransportError::InvalidAddress("endpoint is required".to_string()))?;

        let endpoint = match endpoint.split_once("://") {
            Some(("http" | "https", _)) => endpoint,
            Some((scheme, _)) => {
                return Err(TransportError::InvalidAddress(format!(
                    "unsupported scheme: {scheme}"
                )));
            }
            None => format!("http://{endpoint}"),
        };

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(HttpTransport {
            endpoint,
            client,
            credentials: self.credentials,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_missing_endpoint() {
        let result = HttpTransportBuilder::default().build();
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));

        let result = HttpTransportBuilder::default().endpoint("").build();
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[test]
    fn builder_prefixes_bare_host() {
        let transport = HttpTransport::new("192.168.1.20:8080/touch").unwrap();
        assert_eq!(transport.endpoint(), "http://192.168.1.20:8080/touch");
    }

    #[test]
    fn builder_keeps_https() {
        let transport = HttpTransport::new("https://collector.example/touch").unwrap();
        assert_eq!(transport.endpoint(), "https://collector.example/touch");
    }

    #[test]
    fn builder_rejects_other_schemes() {
        let result = HttpTransport::new("mqtt://broker:1883");
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[test]
    fn builder_with_all_options() {
        let transport = HttpTransportBuilder::default()
            .endpoint("http://localhost/touch")
            .credentials("admin", "secret")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert!(transport.has_credentials());
        assert_eq!(transport.timeout, Duration::from_secs(3));
    }

    #[test]
    fn default_timeout() {
        let transport = HttpTransport::new("localhost").unwrap();
        assert!(!transport.has_credentials());
        assert_eq!(transport.timeout, DEFAULT_TIMEOUT);
    }
}
