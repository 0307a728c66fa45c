// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wiring of the scan and publish tasks.
//!
//! [`Pipeline::builder`] takes the configuration, a [`SensorSource`], a
//! [`Transport`] and optionally a [`StatusSink`]. [`PipelineBuilder::start`]
//! brings up the hardware and spawns both tasks; the returned
//! [`PipelineHandle`] stops them.
//!
//! # Examples
//!
//! ```no_run
//! use touch_relay::config::PipelineConfig;
//! use touch_relay::event::StatusBus;
//! use touch_relay::pipeline::Pipeline;
//! use touch_relay::protocol::MqttTransport;
//! use touch_relay::sensing::{SimulatedPanel, SimulatedSensors};
//!
//! #[tokio::main]
//! async fn main() -> touch_relay::Result<()> {
//!     let transport = MqttTransport::from_url("mqtt://192.168.1.50:1883")?
//!         .topic("panel/touch")
//!         .build()
//!         .await?;
//!
//!     let panel = SimulatedPanel::new();
//!     let handle = Pipeline::builder(PipelineConfig::default())
//!         .source(SimulatedSensors::new(panel.clone()))
//!         .transport(transport)
//!         .status_sink(StatusBus::new())
//!         .start()?;
//!
//!     panel.press(0);
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!
//!     handle.shutdown().await
//! }
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::event::StatusSink;
use crate::protocol::Transport;
use crate::scheduler::{PublishScheduler, ScanScheduler};
use crate::sensing::{ScanCompleteHandle, SensorSource};
use crate::state::AggregationBuffer;

/// Entry point for assembling a pipeline.
#[derive(Debug)]
pub struct Pipeline;

impl Pipeline {
    /// Creates a builder for the given configuration.
    ///
    /// A source and a transport must be supplied before the pipeline can be
    /// built or started.
    #[must_use]
    pub fn builder(config: PipelineConfig) -> PipelineBuilder<(), ()> {
        PipelineBuilder {
            config,
            source: (),
            transport: (),
            status: None,
        }
    }
}

/// Builder for a pipeline.
///
/// The type parameters track whether a source and a transport were supplied.
pub struct PipelineBuilder<S, T> {
    config: PipelineConfig,
    source: S,
    transport: T,
    status: Option<Arc<dyn StatusSink>>,
}

impl<S, T> PipelineBuilder<S, T> {
    /// Sets the sensing hardware.
    #[must_use]
    pub fn source<S2: SensorSource>(self, source: S2) -> PipelineBuilder<S2, T> {
        PipelineBuilder {
            config: self.config,
            source,
            transport: self.transport,
            status: self.status,
        }
    }

    /// Sets the transport batches are published through.
    #[must_use]
    pub fn transport<T2: Transport>(self, transport: T2) -> PipelineBuilder<S, T2> {
        PipelineBuilder {
            config: self.config,
            source: self.source,
            transport,
            status: self.status,
        }
    }

    /// Sets the status sink notified by both tasks.
    #[must_use]
    pub fn status_sink(mut self, sink: impl StatusSink + 'static) -> Self {
        self.status = Some(Arc::new(sink));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl<S, T> PipelineBuilder<S, T>
where
    S: SensorSource + 'static,
    T: Transport + 'static,
{
    /// Validates the configuration, initializes the hardware and assembles the
    /// schedulers without spawning them.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid configuration and
    /// `Error::Sensor` if the hardware fails to initialize.
    pub fn build(self) -> Result<PipelineParts<S, T>> {
        self.config.validate()?;

        let mut source = self.source;
        if let Err(e) = source.init() {
            tracing::error!(error = %e, "Sensing hardware initialization failed");
            return Err(Error::Sensor(e));
        }

        let layout = self.config.layout().clone();
        let buffer = Arc::new(AggregationBuffer::new());

        let mut scan = ScanScheduler::new(
            source,
            layout.clone(),
            Arc::clone(&buffer),
            self.config.scan_period(),
        );
        let mut publish = PublishScheduler::new(
            self.transport,
            layout,
            Arc::clone(&buffer),
            self.config.publish_period(),
        );
        if let Some(status) = self.status {
            scan = scan.with_status_sink(Arc::clone(&status));
            publish = publish.with_status_sink(status);
        }

        Ok(PipelineParts {
            scan,
            publish,
            buffer,
        })
    }

    /// Builds the pipeline and spawns the scan and publish tasks.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build). Nothing is spawned on error.
    pub fn start(self) -> Result<PipelineHandle> {
        let parts = self.build()?;
        Ok(parts.spawn())
    }
}

impl<S, T> std::fmt::Debug for PipelineBuilder<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("config", &self.config)
            .field("has_status_sink", &self.status.is_some())
            .finish_non_exhaustive()
    }
}

/// Assembled but not yet running pipeline.
///
/// Callers that drive ticks themselves use the schedulers directly.
#[derive(Debug)]
pub struct PipelineParts<S, T> {
    /// The scan task.
    pub scan: ScanScheduler<S>,
    /// The publish task.
    pub publish: PublishScheduler<T>,
    /// The buffer shared by both.
    pub buffer: Arc<AggregationBuffer>,
}

impl<S, T> PipelineParts<S, T>
where
    S: SensorSource + 'static,
    T: Transport + 'static,
{
    /// Spawns both tasks on the current Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> PipelineHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scan_complete = self.scan.scan_complete_handle();

        let scan = tokio::spawn(self.scan.run(shutdown_rx.clone()));
        let publish = tokio::spawn(self.publish.run(shutdown_rx));

        tracing::info!("Pipeline started");

        PipelineHandle {
            buffer: self.buffer,
            scan_complete,
            shutdown_tx,
            tasks: vec![scan, publish],
        }
    }
}

/// Handle to a running pipeline.
///
/// Dropping the handle also stops both tasks, without waiting for them.
#[derive(Debug)]
pub struct PipelineHandle {
    buffer: Arc<AggregationBuffer>,
    scan_complete: ScanCompleteHandle,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Returns the aggregation buffer shared by the tasks.
    #[must_use]
    pub fn buffer(&self) -> &Arc<AggregationBuffer> {
        &self.buffer
    }

    /// Returns the handle the hardware signals at the end of each scan.
    #[must_use]
    pub fn scan_complete_handle(&self) -> ScanCompleteHandle {
        self.scan_complete.clone()
    }

    /// Returns `true` once both tasks have exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Stops both tasks and waits for them to exit.
    ///
    /// # Errors
    ///
    /// Returns `Error::Task` if a task panicked or was cancelled.
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down pipeline");
        // Receivers may already be gone if a task exited.
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks {
            task.await.map_err(|e| Error::Task(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::{ConfigError, SensorError};
    use crate::protocol::MemoryTransport;
    use crate::sensing::{SimulatedPanel, SimulatedSensors};

    #[test]
    fn build_rejects_invalid_config() {
        let config = PipelineConfig::default().with_scan_period(Duration::ZERO);
        let result = Pipeline::builder(config)
            .source(SimulatedSensors::new(SimulatedPanel::new()))
            .transport(MemoryTransport::new())
            .build();

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::ZeroPeriod { name: "scan" }))
        ));
    }

    #[test]
    fn build_fails_when_hardware_fails() {
        let panel = SimulatedPanel::new();
        panel.fail_init("no electrodes");

        let result = Pipeline::builder(PipelineConfig::default())
            .source(SimulatedSensors::new(panel))
            .transport(MemoryTransport::new())
            .build();

        assert!(matches!(
            result,
            Err(Error::Sensor(SensorError::InitFailed(_)))
        ));
    }

    #[test]
    fn build_shares_one_buffer() {
        let parts = Pipeline::builder(PipelineConfig::default())
            .source(SimulatedSensors::new(SimulatedPanel::new()))
            .transport(MemoryTransport::new())
            .build()
            .unwrap();

        assert_eq!(Arc::strong_count(&parts.buffer), 3);
        assert_eq!(parts.scan.period(), PipelineConfig::DEFAULT_SCAN_PERIOD);
        assert_eq!(parts.publish.period(), PipelineConfig::DEFAULT_PUBLISH_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_shutdown() {
        let panel = SimulatedPanel::new();
        let handle = Pipeline::builder(PipelineConfig::default())
            .source(SimulatedSensors::new(panel.clone()))
            .transport(MemoryTransport::new())
            .start()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(panel.scans_started() >= 1);
        assert!(!handle.is_finished());

        handle.shutdown().await.unwrap();
    }
}
