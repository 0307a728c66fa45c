// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport.

use std::sync::Arc;

use parking_lot::Mutex;

use super::Transport;
use crate::error::TransportError;

/// Transport that records every payload it is given.
///
/// Useful for running the pipeline without a network, and for tests. It can
/// be told to fail so that the drop-on-failure path can be exercised. Clones
/// share the same record.
///
/// # Examples
///
/// ```
/// use touch_relay::protocol::{MemoryTransport, Transport};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let transport = MemoryTransport::new();
/// transport.publish(b"{}").await.unwrap();
///
/// transport.set_failing(true);
/// assert!(transport.publish(b"{}").await.is_err());
///
/// assert_eq!(transport.payloads(), vec![b"{}".to_vec()]);
/// assert_eq!(transport.attempts(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    payloads: Vec<Vec<u8>>,
    attempts: usize,
    failing: bool,
}

impl MemoryTransport {
    /// Creates an empty transport that accepts every payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent publishes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }

    /// Returns the payloads accepted so far, oldest first.
    #[must_use]
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.inner.lock().payloads.clone()
    }

    /// Returns the accepted payloads decoded as JSON values.
    ///
    /// Payloads that are not valid JSON are skipped.
    #[must_use]
    pub fn json_payloads(&self) -> Vec<serde_json::Value> {
        self.inner
            .lock()
            .payloads
            .iter()
            .filter_map(|p| serde_json::from_slice(p).ok())
            .collect()
    }

    /// Returns the number of publish calls, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }
}

impl Transport for MemoryTransport {
    async fn publish(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock();
        inner.attempts += 1;
        if inner.failing {
            return Err(TransportError::ConnectionFailed(
                "memory transport set to fail".to_string(),
            ));
        }
        inner.payloads.push(payload.to_vec());
        Ok(())
    }
}
