// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic publish task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::SensorLayout;
use crate::event::StatusSink;
use crate::protocol::{Transport, encode_payload};
use crate::state::AggregationBuffer;

/// Result of one publish tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The buffer was empty; the transport was not called.
    Empty,
    /// A batch was handed to the transport.
    Published {
        /// Number of values in the batch.
        entries: usize,
    },
    /// A batch was lost because it could not be delivered.
    Dropped {
        /// Number of values in the batch.
        entries: usize,
        /// Description of the failure.
        error: String,
    },
}

/// Drains the aggregation buffer on a fixed period and publishes the batch.
///
/// Delivery is at most once: a batch that fails to serialize or that the
/// transport rejects is logged and dropped, never put back into the buffer.
pub struct PublishScheduler<T> {
    transport: T,
    layout: SensorLayout,
    buffer: Arc<AggregationBuffer>,
    status: Option<Arc<dyn StatusSink>>,
    period: Duration,
}

impl<T: Transport> PublishScheduler<T> {
    /// Creates a publish scheduler.
    pub fn new(
        transport: T,
        layout: SensorLayout,
        buffer: Arc<AggregationBuffer>,
        period: Duration,
    ) -> Self {
        Self {
            transport,
            layout,
            buffer,
            status: None,
            period,
        }
    }

    /// Reports publish results to `sink`.
    #[must_use]
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = Some(sink);
        self
    }

    /// Returns the publish period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drains the buffer and publishes whatever it held.
    ///
    /// The buffer lock is released before the transport is called.
    pub async fn publish_once(&self) -> PublishOutcome {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            tracing::trace!("Nothing to publish");
            return PublishOutcome::Empty;
        }
        let entries = batch.len();

        let result = match encode_payload(&batch, &self.layout) {
            Ok(payload) => self
                .transport
                .publish(&payload)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                tracing::debug!(entries, "Batch published");
                if let Some(status) = &self.status {
                    status.notify_published(entries);
                }
                PublishOutcome::Published { entries }
            }
            Err(error) => {
                tracing::warn!(entries, error = %error, "Publish failed, batch dropped");
                if let Some(status) = &self.status {
                    status.notify_publish_failed(&error);
                }
                PublishOutcome::Dropped { entries, error }
            }
        }
    }

    /// Publishes once per period until `shutdown` becomes `true` or its sender
    /// is dropped.
    ///
    /// The first publish happens one period after start. Values still buffered
    /// at shutdown are left in the buffer.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            "Publish task started"
        );

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.publish_once().await;
                }
            }
        }

        tracing::info!(pending = self.buffer.len(), "Publish task stopped");
    }
}

impl<T> std::fmt::Debug for PublishScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishScheduler")
            .field("period", &self.period)
            .field("pending", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
