//! Channel send with backpressure handling

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::Sample;
use tracing::{trace, warn};

use crate::config::{DropPolicy, IngestionMetrics};

/// Outcome of a single send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// A sample was discarded (the incoming one or the oldest queued one)
    Dropped,
    Closed,
}

/// Send a sample, applying the drop policy when the channel is full
///
/// `evict` is a receiver handle on the same channel, used to make room under
/// `DropOldest`. Without it `DropOldest` degrades to `DropNewest`.
#[inline]
pub fn send_sample(
    tx: &Sender<Sample>,
    evict: Option<&Receiver<Sample>>,
    sample: Sample,
    metrics: &Arc<IngestionMetrics>,
    source_id: &str,
    drop_policy: DropPolicy,
) -> SendOutcome {
    let outcome = match tx.try_send(sample) {
        Ok(()) => {
            trace!(source_id = %source_id, "sample sent");
            SendOutcome::Sent
        }
        Err(TrySendError::Full(sample)) => {
            metrics.record_dropped();
            metrics::counter!("driver_rating_ingest_dropped_total", "source" => source_id.to_string())
                .increment(1);
            match (drop_policy, evict) {
                (DropPolicy::DropOldest, Some(rx)) => {
                    let _ = rx.try_recv();
                    // A concurrent producer may refill the slot; the sample is lost then
                    let _ = tx.try_send(sample);
                    trace!(source_id = %source_id, "sample dropped (oldest)");
                }
                _ => {
                    trace!(source_id = %source_id, "sample dropped (newest)");
                }
            }
            SendOutcome::Dropped
        }
        Err(TrySendError::Closed(_)) => {
            warn!(source_id = %source_id, "channel closed");
            SendOutcome::Closed
        }
    };
    metrics.update_queue_len(tx.len());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::bounded;
    use contracts::MotionSample;

    fn sample(ts: f64) -> Sample {
        MotionSample::at_rest(ts).into()
    }

    #[test]
    fn test_drop_newest_keeps_queue() {
        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IngestionMetrics::new());
        for ts in [1.0, 2.0, 3.0] {
            send_sample(&tx, None, sample(ts), &metrics, "t", DropPolicy::DropNewest);
        }
        assert_eq!(metrics.snapshot().samples_dropped, 1);
        assert_eq!(rx.try_recv().unwrap().timestamp(), 1.0);
        assert_eq!(rx.try_recv().unwrap().timestamp(), 2.0);
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IngestionMetrics::new());
        for ts in [1.0, 2.0, 3.0] {
            send_sample(&tx, Some(&rx), sample(ts), &metrics, "t", DropPolicy::DropOldest);
        }
        assert_eq!(metrics.snapshot().samples_dropped, 1);
        assert_eq!(rx.try_recv().unwrap().timestamp(), 2.0);
        assert_eq!(rx.try_recv().unwrap().timestamp(), 3.0);
    }

    #[test]
    fn test_closed_channel() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let metrics = Arc::new(IngestionMetrics::new());
        let outcome = send_sample(&tx, None, sample(0.0), &metrics, "t", DropPolicy::DropNewest);
        assert_eq!(outcome, SendOutcome::Closed);
    }
}
