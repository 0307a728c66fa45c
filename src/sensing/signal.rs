// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-slot "scan complete" signal.
//!
//! The sensing hardware reports the end of a scan from interrupt context. That
//! context may only flip a flag and wake the scan task: it must not block,
//! allocate, or touch any shared buffer. [`ScanCompleteHandle::signal`]
//! satisfies all three and can be called from any thread.
//!
//! At most one signal is outstanding: signalling twice before the scan task
//! waits is the same as signalling once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalSlot {
    pending: AtomicBool,
    notify: Notify,
}

/// Receiving side of the scan-complete signal, owned by the scan task.
#[derive(Debug, Default)]
pub struct ScanSignal {
    slot: Arc<SignalSlot>,
}

impl ScanSignal {
    /// Creates a signal with no pending completion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that the hardware callback uses to signal completion.
    #[must_use]
    pub fn handle(&self) -> ScanCompleteHandle {
        ScanCompleteHandle {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Returns `true` if a completion is waiting to be consumed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.pending.load(Ordering::Acquire)
    }

    /// Discards a completion left over from an earlier scan.
    ///
    /// Called before each scan request so that the next [`wait`](Self::wait)
    /// only returns for the scan that was just requested.
    pub fn clear(&self) {
        self.slot.pending.store(false, Ordering::Release);
    }

    /// Waits for the next completion and consumes it.
    pub async fn wait(&self) {
        loop {
            let notified = self.slot.notify.notified();
            if self.slot.pending.swap(false, Ordering::AcqRel) {
                return;
            }
            // A stored permit may belong to a cleared signal; the flag decides.
            notified.await;
        }
    }
}

/// Sending side of the scan-complete signal.
///
/// Cheap to clone. Registered with the [`SensorSource`](super::SensorSource)
/// so that its end-of-scan callback can wake the scan task.
#[derive(Debug, Clone)]
pub struct ScanCompleteHandle {
    slot: Arc<SignalSlot>,
}

impl ScanCompleteHandle {
    /// Signals that the current scan has completed.
    ///
    /// Never blocks, never allocates and never fails.
    pub fn signal(&self) {
        self.slot.pending.store(true, Ordering::Release);
        self.slot.notify.notify_one();
    }
}
