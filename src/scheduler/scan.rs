// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic scan task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::SensorLayout;
use crate::event::StatusSink;
use crate::sensing::{ScanCompleteHandle, ScanSignal, SensorSource};
use crate::state::{AggregationBuffer, SensorChange, Snapshot, TouchDiffer};

/// Where the scan task is within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A scan was started and its completion is awaited.
    ScanRequested,
    /// The hardware reported the end of the scan.
    ScanComplete,
    /// Sensor status is being read and diffed.
    Processing,
}

/// Result of one scan tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCycle {
    /// The hardware was still busy; nothing was requested.
    Skipped,
    /// A scan ran to completion.
    Completed {
        /// Transitions observed in this scan.
        changes: Vec<SensorChange>,
    },
}

impl ScanCycle {
    /// Returns `true` if the tick was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Returns the observed transitions (empty for a skipped tick).
    #[must_use]
    pub fn changes(&self) -> &[SensorChange] {
        match self {
            Self::Skipped => &[],
            Self::Completed { changes } => changes,
        }
    }
}

/// Drives the sensing hardware on a fixed period.
///
/// Each tick requests a scan, waits for the end-of-scan signal, diffs the
/// result against the previous scan and merges the reportable values into the
/// shared [`AggregationBuffer`]. A tick that finds the hardware busy is skipped,
/// never queued.
pub struct ScanScheduler<S> {
    source: S,
    signal: ScanSignal,
    differ: TouchDiffer,
    layout: SensorLayout,
    buffer: Arc<AggregationBuffer>,
    status: Option<Arc<dyn StatusSink>>,
    period: Duration,
    phase: ScanPhase,
}

impl<S: SensorSource> ScanScheduler<S> {
    /// Creates a scheduler and registers its scan-complete handle with
    /// `source`.
    pub fn new(
        mut source: S,
        layout: SensorLayout,
        buffer: Arc<AggregationBuffer>,
        period: Duration,
    ) -> Self {
        let signal = ScanSignal::new();
        source.register_scan_complete(signal.handle());

        Self {
            source,
            signal,
            differ: TouchDiffer::new(),
            layout,
            buffer,
            status: None,
            period,
            phase: ScanPhase::Idle,
        }
    }

    /// Reports activity and transitions to `sink`.
    #[must_use]
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = Some(sink);
        self
    }

    /// Returns another handle to the signal the source was registered with.
    #[must_use]
    pub fn scan_complete_handle(&self) -> ScanCompleteHandle {
        self.signal.handle()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Returns the scan period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the diff state.
    #[must_use]
    pub fn differ(&self) -> &TouchDiffer {
        &self.differ
    }

    /// Returns the sensor source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs one scan tick.
    ///
    /// Waits for the end-of-scan signal without a timeout.
    pub async fn run_cycle(&mut self) -> ScanCycle {
        if self.source.is_busy() {
            tracing::trace!("Sensing hardware busy, skipping scan");
            return ScanCycle::Skipped;
        }

        // A completion from an earlier scan must not satisfy this one.
        self.signal.clear();
        self.set_phase(ScanPhase::ScanRequested);
        self.source.request_scan();

        self.signal.wait().await;
        self.set_phase(ScanPhase::ScanComplete);

        self.set_phase(ScanPhase::Processing);
        self.source.process();
        let snapshot = Snapshot::capture(&self.source, &self.layout);
        let outcome = self.differ.diff(&snapshot);
        let buffered = self.buffer.merge(outcome.updates);

        for change in &outcome.changes {
            tracing::debug!(
                sensor = %change.id,
                previous = %change.previous,
                current = %change.current,
                "Sensor changed"
            );
            if let Some(status) = &self.status {
                status.notify_sensor_change(change.id, &change.current);
            }
        }
        if let Some(status) = &self.status {
            status.notify_active(outcome.any_active);
        }
        if buffered > 0 {
            tracing::trace!(buffered, "Updates merged into aggregation buffer");
        }

        self.set_phase(ScanPhase::Idle);
        ScanCycle::Completed {
            changes: outcome.changes,
        }
    }

    /// Runs scan ticks until `shutdown` becomes `true` or its sender is
    /// dropped.
    ///
    /// The first scan starts immediately. Ticks missed while a scan overruns
    /// are skipped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            sensors = self.layout.len(),
            "Scan task started"
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
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => break,
                        _ = self.run_cycle() => {}
                    }
                }
            }
        }

        tracing::info!("Scan task stopped");
    }

    fn set_phase(&mut self, phase: ScanPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "Scan phase");
        self.phase = phase;
    }
}

impl<S> std::fmt::Debug for ScanScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanScheduler")
            .field("period", &self.period)
            .field("phase", &self.phase)
            .field("sensors", &self.layout.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::event::{StatusBus, StatusEvent};
    use crate::sensing::{SimulatedPanel, SimulatedSensors, SliderTouch};
    use crate::types::{SensorId, SensorReading};

    fn scheduler(panel: &SimulatedPanel) -> ScanScheduler<SimulatedSensors> {
        ScanScheduler::new(
            SimulatedSensors::new(panel.clone()),
            SensorLayout::reference_board(),
            Arc::new(AggregationBuffer::new()),
            Duration::from_millis(20),
        )
    }

    /// Source whose end-of-scan callback only fires when the test says so.
    struct ManualSource {
        handle: Option<ScanCompleteHandle>,
        requested: u32,
    }

    impl SensorSource for ManualSource {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn register_scan_complete(&mut self, handle: ScanCompleteHandle) {
            self.handle = Some(handle);
        }

        fn is_busy(&self) -> bool {
            false
        }

        fn request_scan(&mut self) {
            self.requested += 1;
        }

        fn is_sensor_active(&self, _button: u8) -> bool {
            false
        }

        fn slider_touch_info(&self, _slider: u8) -> Option<SliderTouch> {
            None
        }
    }

    #[tokio::test]
    async fn first_cycle_is_silent() {
        let panel = SimulatedPanel::new();
        panel.press(0);
        let mut scheduler = scheduler(&panel);

        let cycle = scheduler.run_cycle().await;

        assert_eq!(cycle, ScanCycle::Completed { changes: vec![] });
        assert!(scheduler.buffer.is_empty());
        assert_eq!(scheduler.phase(), ScanPhase::Idle);
    }

    #[tokio::test]
    async fn press_is_buffered_once() {
        let panel = SimulatedPanel::new();
        let mut scheduler = scheduler(&panel);

        scheduler.run_cycle().await;
        panel.press(0);
        let cycle = scheduler.run_cycle().await;
        scheduler.run_cycle().await;

        assert_eq!(cycle.changes().len(), 1);
        assert_eq!(cycle.changes()[0].id, SensorId::Button(0));
        let batch = scheduler.buffer.drain();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get(SensorId::Button(0)), Some("1"));
    }

    #[tokio::test]
    async fn busy_hardware_skips_the_tick() {
        let panel = SimulatedPanel::new();
        let mut scheduler = scheduler(&panel);

        panel.set_busy(true);
        let cycle = scheduler.run_cycle().await;

        assert!(cycle.is_skipped());
        assert_eq!(panel.scans_started(), 0);
        assert_eq!(scheduler.phase(), ScanPhase::Idle);
    }

    #[tokio::test]
    async fn slider_release_is_a_change_without_update() {
        let panel = SimulatedPanel::new();
        let mut scheduler = scheduler(&panel);

        panel.touch_slider(0, 42);
        scheduler.run_cycle().await;
        panel.touch_slider(0, 57);
        scheduler.run_cycle().await;
        panel.lift_slider(0);
        let release = scheduler.run_cycle().await;

        assert_eq!(release.changes().len(), 1);
        assert_eq!(release.changes()[0].current, SensorReading::untouched(0));
        let batch = scheduler.buffer.drain();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get(SensorId::Slider(0)), Some("57"));
    }

    #[tokio::test]
    async fn status_sink_sees_activity_and_changes() {
        let panel = SimulatedPanel::new();
        let bus = StatusBus::new();
        let mut rx = bus.subscribe();
        let mut scheduler = scheduler(&panel).with_status_sink(Arc::new(bus));

        scheduler.run_cycle().await;
        panel.press(1);
        scheduler.run_cycle().await;

        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: false }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::SensorChanged {
                id: SensorId::Button(1),
                reading: SensorReading::Digital(true),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StatusEvent::ActiveChanged { active: true }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_waits_for_the_completion_signal() {
        let mut scheduler = ScanScheduler::new(
            ManualSource {
                handle: None,
                requested: 0,
            },
            SensorLayout::reference_board(),
            Arc::new(AggregationBuffer::new()),
            Duration::from_millis(20),
        );
        let handle = scheduler.scan_complete_handle();

        // A completion left over from before the request is discarded.
        handle.signal();

        let cycle = tokio::time::timeout(Duration::from_millis(100), scheduler.run_cycle()).await;
        assert!(cycle.is_err());
        assert_eq!(scheduler.phase(), ScanPhase::ScanRequested);
        assert_eq!(scheduler.source().requested, 1);

        let completer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle.signal();
        });
        let cycle = scheduler.run_cycle().await;
        completer.await.unwrap();

        assert!(!cycle.is_skipped());
        assert_eq!(scheduler.phase(), ScanPhase::Idle);
        assert_eq!(scheduler.source().requested, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_scans_immediately_and_periodically() {
        let panel = SimulatedPanel::new();
        let scheduler = scheduler(&panel);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(scheduler.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(panel.scans_started(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(panel.scans_started(), 6);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_sender_dropped() {
        let panel = SimulatedPanel::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(scheduler(&panel).run(shutdown_rx));

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
