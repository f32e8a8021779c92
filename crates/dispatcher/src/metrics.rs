//! Per-sink delivery accounting
//!
//! The dispatcher loop and the sink worker update the same counters; every
//! update is mirrored to the global recorder labelled with the sink name.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::ScoredEvent;
use serde::Serialize;

/// Delivery counters for one sink
#[derive(Debug)]
pub struct SinkMetrics {
    sink: String,
    queue_len: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    /// Highest event sequence the sink has written
    last_sequence: AtomicU64,
}

impl SinkMetrics {
    pub fn new(sink: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            queue_len: AtomicUsize::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            last_sequence: AtomicU64::new(0),
        }
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    pub(crate) fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        metrics::gauge!("driver_rating_sink_queue_depth", "sink" => self.sink.clone())
            .set(len as f64);
    }

    pub(crate) fn record_written(&self, scored: &ScoredEvent) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.last_sequence
            .fetch_max(scored.sequence, Ordering::Relaxed);
        metrics::counter!("driver_rating_sink_writes_total", "sink" => self.sink.clone())
            .increment(1);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("driver_rating_sink_failures_total", "sink" => self.sink.clone())
            .increment(1);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("driver_rating_sink_dropped_total", "sink" => self.sink.clone())
            .increment(1);
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            last_sequence: self.last_sequence(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub last_sequence: u64,
}

impl MetricsSnapshot {
    /// Events the sink was offered, whatever their fate
    pub fn offered(&self) -> u64 {
        self.write_count + self.failure_count + self.dropped_count
    }

    /// Share of offered events that reached the sink (1.0 when none offered)
    pub fn delivery_ratio(&self) -> f64 {
        match self.offered() {
            0 => 1.0,
            offered => self.write_count as f64 / offered as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DrivingEvent, EventKind};

    fn scored(sequence: u64) -> ScoredEvent {
        ScoredEvent {
            sequence,
            event: DrivingEvent::new(EventKind::ZigZag, 0.0, "Zig-zag driving detected", 2.5),
            score_after: 95,
        }
    }

    #[test]
    fn test_last_sequence_is_monotone() {
        let m = SinkMetrics::new("console");
        m.record_written(&scored(3));
        m.record_written(&scored(1));
        assert_eq!(m.write_count(), 2);
        assert_eq!(m.last_sequence(), 3);
    }

    #[test]
    fn test_delivery_ratio() {
        let m = SinkMetrics::new("trip_log");
        assert_eq!(m.snapshot().delivery_ratio(), 1.0);

        m.record_written(&scored(1));
        m.record_written(&scored(2));
        m.record_written(&scored(3));
        m.record_dropped();

        let snap = m.snapshot();
        assert_eq!(snap.offered(), 4);
        assert!((snap.delivery_ratio() - 0.75).abs() < 1e-12);
    }
}
