// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process sensor source.
//!
//! [`SimulatedSensors`] behaves like the real hardware from the pipeline's
//! point of view: a scan must be requested, completion is signalled through
//! the registered [`ScanCompleteHandle`], and status only changes after
//! [`SensorSource::process`] has run. The physical panel is modelled by a
//! shared [`SimulatedPanel`] that tests (or a host-side demo) manipulate while
//! the pipeline is running.
//!
//! # Examples
//!
//! ```
//! use touch_relay::sensing::{SensorSource, SimulatedPanel, SimulatedSensors};
//!
//! let panel = SimulatedPanel::new();
//! let mut sensors = SimulatedSensors::new(panel.clone());
//!
//! panel.press(0);
//! sensors.request_scan();
//! sensors.process();
//! assert!(sensors.is_sensor_active(0));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{ScanCompleteHandle, SensorSource, SliderTouch};
use crate::error::SensorError;

#[derive(Debug, Clone, Default)]
struct PanelState {
    buttons: HashMap<u8, bool>,
    sliders: HashMap<u8, SliderTouch>,
}

#[derive(Debug, Default)]
struct PanelInner {
    state: Mutex<PanelState>,
    busy: Mutex<bool>,
    init_failure: Mutex<Option<String>>,
    scans: AtomicU64,
}

/// Handle on the simulated physical panel.
///
/// Cheap to clone; all clones act on the same panel.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPanel {
    inner: Arc<PanelInner>,
}

impl SimulatedPanel {
    /// Creates a panel with nothing touched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Presses a button.
    pub fn press(&self, button: u8) {
        self.inner.state.lock().buttons.insert(button, true);
    }

    /// Releases a button.
    pub fn release(&self, button: u8) {
        self.inner.state.lock().buttons.insert(button, false);
    }

    /// Places one finger on a slider at the given position.
    pub fn touch_slider(&self, slider: u8, position: u32) {
        self.inner
            .state
            .lock()
            .sliders
            .insert(slider, SliderTouch::single(position));
    }

    /// Reports an arbitrary touch count and position for a slider.
    pub fn set_slider(&self, slider: u8, touch: SliderTouch) {
        self.inner.state.lock().sliders.insert(slider, touch);
    }

    /// Lifts every finger from a slider.
    pub fn lift_slider(&self, slider: u8) {
        self.inner.state.lock().sliders.remove(&slider);
    }

    /// Forces the hardware busy state. While busy, scan requests are ignored.
    pub fn set_busy(&self, busy: bool) {
        *self.inner.busy.lock() = busy;
    }

    /// Makes the next [`SensorSource::init`] call fail with the given reason.
    pub fn fail_init(&self, reason: impl Into<String>) {
        *self.inner.init_failure.lock() = Some(reason.into());
    }

    /// Returns how many scans have been started.
    #[must_use]
    pub fn scans_started(&self) -> u64 {
        self.inner.scans.load(Ordering::Relaxed)
    }
}

/// [`SensorSource`] backed by a [`SimulatedPanel`].
///
/// Scans complete immediately: `request_scan` signals the registered handle
/// before returning, as an end-of-scan interrupt firing right away would.
#[derive(Debug)]
pub struct SimulatedSensors {
    panel: SimulatedPanel,
    on_complete: Option<ScanCompleteHandle>,
    scanned: Option<PanelState>,
    processed: PanelState,
}

impl SimulatedSensors {
    /// Creates a source reading from the given panel.
    #[must_use]
    pub fn new(panel: SimulatedPanel) -> Self {
        Self {
            panel,
            on_complete: None,
            scanned: None,
            processed: PanelState::default(),
        }
    }

    /// Returns the panel this source reads.
    #[must_use]
    pub fn panel(&self) -> &SimulatedPanel {
        &self.panel
    }
}

impl SensorSource for SimulatedSensors {
    fn init(&mut self) -> Result<(), SensorError> {
        match self.panel.inner.init_failure.lock().take() {
            Some(reason) => Err(SensorError::InitFailed(reason)),
            None => Ok(()),
        }
    }

    fn register_scan_complete(&mut self, handle: ScanCompleteHandle) {
        self.on_complete = Some(handle);
    }

    fn is_busy(&self) -> bool {
        *self.panel.inner.busy.lock()
    }

    fn request_scan(&mut self) {
        if self.is_busy() {
            return;
        }
        self.panel.inner.scans.fetch_add(1, Ordering::Relaxed);
        self.scanned = Some(self.panel.inner.state.lock().clone());

        if let Some(handle) = &self.on_complete {
            handle.signal();
        }
    }

    fn process(&mut self) {
        if let Some(scanned) = self.scanned.take() {
            self.processed = scanned;
        }
    }

    fn is_sensor_active(&self, button: u8) -> bool {
        self.processed.buttons.get(&button).copied().unwrap_or(false)
    }

    fn slider_touch_info(&self, slider: u8) -> Option<SliderTouch> {
        self.processed.sliders.get(&slider).copied()
    }
}
