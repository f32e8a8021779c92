//! Dispatcher - fans scored events out to every configured sink

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ScoredEvent, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::{Delivery, SinkHandle};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Final per-sink metrics, in configuration order
pub type SinkReport = Vec<(String, MetricsSnapshot)>;

/// Start a worker for one configured sink
#[instrument(
    name = "dispatcher_open_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn open_sink(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let handle = match config.sink_type {
        SinkType::Log => SinkHandle::spawn(LogSink::new(&config.name), config.queue_capacity),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            SinkHandle::spawn(sink, config.queue_capacity)
        }
    };
    Ok(handle)
}

/// Fans scored events out to every sink
///
/// Each sink has its own bounded queue; a slow or failing sink only loses its
/// own events.
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<ScoredEvent>,
}

impl Dispatcher {
    /// Open every configured sink; the first one that cannot be opened fails the lot
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_configs(
        configs: &[SinkConfig],
        input_rx: mpsc::Receiver<ScoredEvent>,
    ) -> Result<Self, DispatcherError> {
        let handles = configs
            .iter()
            .map(open_sink)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_handles(handles, input_rx))
    }

    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<ScoredEvent>) -> Self {
        Self { handles, input_rx }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    pub fn metrics(&self) -> SinkReport {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run until the input channel closes, then drain and close every sink
    #[instrument(name = "dispatcher_run", skip(self), fields(sinks = self.handles.len()))]
    pub async fn run(mut self) -> SinkReport {
        info!("dispatcher started");

        let mut received: u64 = 0;
        let mut undelivered: u64 = 0;

        while let Some(scored) = self.input_rx.recv().await {
            received += 1;
            let queued = self
                .handles
                .iter()
                .filter(|h| h.offer(&scored) == Delivery::Queued)
                .count();

            if queued == 0 && !self.handles.is_empty() {
                undelivered += 1;
                warn!(sequence = scored.sequence, "event reached no sink");
            }
            if received.is_multiple_of(100) {
                debug!(events = received, "dispatcher progress");
            }
        }

        let metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        for handle in self.handles {
            handle.shutdown().await;
        }

        info!(events = received, undelivered, "dispatcher stopped");
        metrics
            .into_iter()
            .map(|(name, m)| (name, m.snapshot()))
            .collect()
    }

    /// Run on a background task
    pub fn spawn(self) -> JoinHandle<SinkReport> {
        tokio::spawn(self.run())
    }
}

/// Dispatcher over the given sink configs
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<ScoredEvent>,
) -> Result<Dispatcher, DispatcherError> {
    Dispatcher::from_configs(&sink_configs, input_rx)
}
