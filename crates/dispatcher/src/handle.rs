//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{EventSink, ScoredEvent};

use crate::metrics::SinkMetrics;

/// What happened to an event offered to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue full; the event is lost for this sink only
    Dropped,
    /// Worker already gone
    Closed,
}

/// Handle to a running sink worker
pub struct SinkHandle {
    tx: mpsc::Sender<ScoredEvent>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn a worker that writes queued events into `sink`
    pub fn spawn<S: EventSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new(sink.name()));
        let worker = tokio::spawn(drain_into(sink, rx, Arc::clone(&metrics)));

        Self {
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        self.metrics.sink()
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue an event without waiting
    pub fn offer(&self, scored: &ScoredEvent) -> Delivery {
        match self.tx.try_send(scored.clone()) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Delivery::Queued
            }
            Err(mpsc::error::TrySendError::Full(lost)) => {
                self.metrics.record_dropped();
                warn!(
                    sink = %self.name(),
                    sequence = lost.sequence,
                    kind = %lost.event.kind,
                    "sink queue full, event dropped"
                );
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name(), "sink worker closed unexpectedly");
                Delivery::Closed
            }
        }
    }

    /// Close the queue and wait for the worker to flush and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name()))]
    pub async fn shutdown(self) {
        let Self {
            tx,
            metrics,
            worker,
        } = self;
        drop(tx);

        if let Err(e) = worker.await {
            error!(sink = %metrics.sink(), error = ?e, "sink worker panicked");
        }
        debug!(sink = %metrics.sink(), written = metrics.write_count(), "sink stopped");
    }
}

#[instrument(name = "sink_worker", skip_all, fields(sink = %metrics.sink()))]
async fn drain_into<S: EventSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<ScoredEvent>,
    metrics: Arc<SinkMetrics>,
) {
    while let Some(scored) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        if let Err(e) = sink.write(&scored).await {
            metrics.record_failed();
            error!(sequence = scored.sequence, error = %e, "sink write failed");
        } else {
            metrics.record_written(&scored);
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "sink flush failed");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "sink close failed");
    }
}
