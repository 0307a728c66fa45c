// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregation buffer shared by the scan and publish tasks.
//!
//! The buffer holds at most one pending value per sensor: writing a sensor
//! twice before the next drain keeps only the second value. Draining takes
//! every entry and leaves the buffer empty in one step.
//!
//! All operations hold a single [`parking_lot::Mutex`] for their own duration
//! only. Nothing is awaited while the lock is held.
//!
//! # Examples
//!
//! ```
//! use touch_relay::state::AggregationBuffer;
//! use touch_relay::types::SensorId;
//!
//! let buffer = AggregationBuffer::new();
//! buffer.put(SensorId::Slider(0), "10");
//! buffer.put(SensorId::Slider(0), "42");
//!
//! let batch = buffer.drain();
//! assert_eq!(batch.len(), 1);
//! assert_eq!(batch.get(SensorId::Slider(0)), Some("42"));
//! assert!(buffer.drain().is_empty());
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;

use super::PendingUpdate;
use crate::types::SensorId;

/// Last-write-wins map from sensor to pending encoded value.
#[derive(Debug, Default)]
pub struct AggregationBuffer {
    entries: Mutex<HashMap<SensorId, String>>,
}

impl AggregationBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the pending value of a sensor.
    pub fn put(&self, id: SensorId, value: impl Into<String>) {
        self.entries.lock().insert(id, value.into());
    }

    /// Applies every update of one scan pass under a single lock acquisition.
    ///
    /// Returns the number of updates applied.
    pub fn merge(&self, updates: impl IntoIterator<Item = PendingUpdate>) -> usize {
        let mut entries = self.entries.lock();
        let mut applied = 0;
        for update in updates {
            entries.insert(update.id, update.value);
            applied += 1;
        }
        applied
    }

    /// Removes and returns every pending entry.
    ///
    /// Draining an empty buffer returns an empty batch; it is not an error.
    #[must_use]
    pub fn drain(&self) -> Batch {
        Batch {
            entries: std::mem::take(&mut *self.entries.lock()),
        }
    }

    /// Returns the number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// The entries taken from the buffer by one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: HashMap<SensorId, String>,
}

impl Batch {
    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the batch holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value drained for a sensor.
    #[must_use]
    pub fn get(&self, id: SensorId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Iterates over entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorId, &str)> {
        self.entries.iter().map(|(id, value)| (*id, value.as_str()))
    }
}

impl FromIterator<(SensorId, String)> for Batch {
    fn from_iter<T: IntoIterator<Item = (SensorId, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn put_overwrites_same_id() {
        let buffer = AggregationBuffer::new();
        buffer.put(SensorId::Button(0), "1");
        buffer.put(SensorId::Button(0), "0");

        assert_eq!(buffer.len(), 1);
        let batch = buffer.drain();
        assert_eq!(batch.get(SensorId::Button(0)), Some("0"));
    }

    #[test]
    fn drain_empties_buffer() {
        let buffer = AggregationBuffer::new();
        buffer.put(SensorId::Button(0), "1");
        buffer.put(SensorId::Slider(0), "42");

        let batch = buffer.drain();
        assert_eq!(batch.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_on_empty_is_idempotent() {
        let buffer = AggregationBuffer::new();
        assert!(buffer.drain().is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn merge_applies_in_order() {
        let buffer = AggregationBuffer::new();
        let applied = buffer.merge(vec![
            PendingUpdate::new(SensorId::Slider(0), "10"),
            PendingUpdate::new(SensorId::Button(1), "1"),
            PendingUpdate::new(SensorId::Slider(0), "12"),
        ]);

        assert_eq!(applied, 3);
        let batch = buffer.drain();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get(SensorId::Slider(0)), Some("12"));
        assert_eq!(batch.get(SensorId::Button(1)), Some("1"));
    }

    #[test]
    fn concurrent_put_and_drain_lose_nothing() {
        const WRITERS: u8 = 4;
        const WRITES: u32 = 2_000;

        let buffer = Arc::new(AggregationBuffer::new());

        let writers: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for value in 0..WRITES {
                        buffer.put(SensorId::Slider(writer), value.to_string());
                    }
                })
            })
            .collect();

        let mut drained: Vec<Batch> = Vec::new();
        while writers.iter().any(|w| !w.is_finished()) {
            drained.push(buffer.drain());
        }
        for writer in writers {
            writer.join().unwrap();
        }
        drained.push(buffer.drain());

        for writer in 0..WRITERS {
            let id = SensorId::Slider(writer);
            let seen: Vec<u32> = drained
                .iter()
                .filter_map(|batch| batch.get(id))
                .map(|value| value.parse().unwrap())
                .collect();

            // Every drained value was written, values only move forward, and
            // the final write always reaches some drain.
            assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
            assert_eq!(seen.last().copied(), Some(WRITES - 1));
        }
    }
}
