// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary with the sensing hardware.
//!
//! The pipeline does not drive electrodes or filter raw counts itself. It
//! talks to a [`SensorSource`], which exposes the busy state of the hardware,
//! lets the scan task start a scan, and reports per-widget status once the
//! scan has been processed. End of scan is reported asynchronously through a
//! [`ScanCompleteHandle`].
//!
//! [`SimulatedSensors`] is an in-process source for tests and host demos.

mod signal;
mod simulated;

pub use signal::{ScanCompleteHandle, ScanSignal};
pub use simulated::{SimulatedPanel, SimulatedSensors};

use crate::error::SensorError;

/// Number of simultaneous touches for which a slider position is reported.
///
/// With several fingers on a slider the centroid is meaningless, so such a
/// slider is treated as untouched.
pub const SLIDER_NUM_TOUCH: u8 = 1;

/// Touch information reported by a slider widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderTouch {
    /// Number of touches currently detected on the slider.
    pub count: u8,
    /// Position of the first touch.
    pub position: u32,
}

impl SliderTouch {
    /// Creates touch information for a single finger.
    #[must_use]
    pub const fn single(position: u32) -> Self {
        Self { count: 1, position }
    }

    /// Returns `true` if the slider reports a usable position.
    #[must_use]
    pub const fn is_touched(&self) -> bool {
        self.count == SLIDER_NUM_TOUCH
    }
}

/// Access to the touch sensing hardware.
///
/// Implementations are owned by the scan task and only ever called from it;
/// the single exception is the [`ScanCompleteHandle`] registered through
/// [`register_scan_complete`](Self::register_scan_complete), which the
/// implementation signals from its end-of-scan interrupt.
pub trait SensorSource: Send {
    /// Brings up the sensing hardware.
    ///
    /// # Errors
    ///
    /// Returns `SensorError` if the hardware cannot be initialized. The
    /// pipeline refuses to start in that case.
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Registers the handle to signal when a scan completes.
    fn register_scan_complete(&mut self, handle: ScanCompleteHandle);

    /// Returns `true` while a scan is in progress.
    fn is_busy(&self) -> bool;

    /// Starts scanning all widgets.
    fn request_scan(&mut self);

    /// Runs the hardware-side processing of the last scan (baseline update,
    /// filtering, status computation). Called once per completed scan, before
    /// any status is read.
    fn process(&mut self) {}

    /// Returns whether the given button widget is active.
    fn is_sensor_active(&self, button: u8) -> bool;

    /// Returns touch information for the given slider widget, or `None` if the
    /// slider reports nothing.
    fn slider_touch_info(&self, slider: u8) -> Option<SliderTouch>;
}
