// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast status sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::broadcast;

use super::{StatusEvent, StatusSink};
use crate::types::{SensorId, SensorReading};

/// Default channel capacity for the status bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

const ACTIVE_UNKNOWN: u8 = 0;
const ACTIVE_OFF: u8 = 1;
const ACTIVE_ON: u8 = 2;

/// [`StatusSink`] that broadcasts [`StatusEvent`]s to any number of
/// subscribers.
///
/// The scan task reports the activity indicator on every cycle; the bus only
/// forwards it when it changes, so subscribers see transitions rather than a
/// 50 Hz stream.
///
/// A slow subscriber loses the oldest events (`RecvError::Lagged`).
///
/// # Examples
///
/// ```
/// use touch_relay::event::{StatusBus, StatusEvent, StatusSink};
///
/// let bus = StatusBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.notify_active(true);
/// bus.notify_active(true);
///
/// assert_eq!(rx.try_recv().unwrap(), StatusEvent::ActiveChanged { active: true });
/// assert!(rx.try_recv().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct StatusBus {
    sender: broadcast::Sender<StatusEvent>,
    last_active: Arc<AtomicU8>,
}

impl StatusBus {
    /// Creates a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            last_active: Arc::new(AtomicU8::new(ACTIVE_UNKNOWN)),
        }
    }

    /// Subscribes to status events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, event: StatusEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for StatusBus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StatusBus {
    fn notify_active(&self, active: bool) {
        let encoded = if active { ACTIVE_ON } else { ACTIVE_OFF };
        if self.last_active.swap(encoded, Ordering::AcqRel) != encoded {
            self.publish(StatusEvent::ActiveChanged { active });
        }
    }

    fn notify_sensor_change(&self, id: SensorId, reading: &SensorReading) {
        self.publish(StatusEvent::SensorChanged {
            id,
            reading: *reading,
        });
    }

    fn notify_published(&self, entries: usize) {
        self.publish(StatusEvent::Published { entries });
    }

    fn notify_publish_failed(&self, error: &str) {
        self.publish(StatusEvent::PublishFailed {
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = StatusBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn notify_without_subscribers_is_silent() {
        let bus = StatusBus::new();
        bus.notify_active(true);
        bus.notify_published(3);
    }

    #[tokio::test]
    async fn active_is_forwarded_on_transitions_only() {
        let bus = StatusBus::new();
        let mut rx = bus.subscribe();

        bus.notify_active(false);
        bus.notify_active(false);
        bus.notify_active(true);
        bus.notify_active(true);
        bus.notify_active(false);

        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: false }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: true }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: false }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sensor_change_is_forwarded() {
        let bus = StatusBus::new();
        let mut rx = bus.subscribe();

        bus.notify_sensor_change(SensorId::Slider(0), &SensorReading::touched(42));

        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::SensorChanged {
                id: SensorId::Slider(0),
                reading: SensorReading::touched(42),
            }
        );
    }

    #[tokio::test]
    async fn clones_share_channel_and_indicator() {
        let bus = StatusBus::new();
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        bus.notify_active(true);
        clone.notify_active(true);
        clone.notify_publish_failed("broker unreachable");

        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: true }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::PublishFailed {
                error: "broker unreachable".to_string()
            }
        );
    }
}
