//! 数据源适配器
//!
//! 把 `SampleSource` 的回调接入 ingestion 通道，负责背压与计数。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use contracts::{Sample, SampleCallback, SampleKind, SampleSource};
use tracing::{debug, trace};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::send::{send_sample, SendOutcome};

/// Bridges one `SampleSource` to the shared channel
pub struct SourceAdapter {
    source_id: String,
    source: Box<dyn SampleSource>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    pub fn new(source_id: String, source: Box<dyn SampleSource>, config: BackpressureConfig) -> Self {
        Self {
            source_id,
            source,
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn kind(&self) -> Option<SampleKind> {
        self.source.kind()
    }

    /// Start forwarding samples; a second call is a no-op
    pub fn start(
        &self,
        tx: Sender<Sample>,
        evict: Receiver<Sample>,
        metrics: Arc<IngestionMetrics>,
    ) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let source_id = self.source_id.clone();
        let drop_policy = self.config.drop_policy;
        let listening = self.listening.clone();

        debug!(source_id = %source_id, "starting source adapter");

        let callback: SampleCallback = Arc::new(move |sample| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            metrics.record_received();
            metrics::counter!("driver_rating_ingest_samples_total", "kind" => sample.kind().as_str())
                .increment(1);
            trace!(source_id = %source_id, kind = %sample.kind(), "adapter received sample");
            if send_sample(&tx, Some(&evict), sample, &metrics, &source_id, drop_policy)
                == SendOutcome::Closed
            {
                listening.store(false, Ordering::SeqCst);
            }
        });

        self.source.listen(callback);
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source_id = %self.source_id, "stopping source adapter");
        }
        self.source.stop();
    }

    /// True while both the adapter and its producer are active
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed) && self.source.is_listening()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropPolicy;
    use async_channel::bounded;
    use contracts::MotionSample;
    use std::time::Duration;

    /// Emits at-rest motion samples every 5 ms until stopped
    struct TickingSource {
        listening: Arc<AtomicBool>,
    }

    impl SampleSource for TickingSource {
        fn source_id(&self) -> &str {
            "ticking"
        }

        fn kind(&self) -> Option<SampleKind> {
            Some(SampleKind::Motion)
        }

        fn listen(&self, callback: SampleCallback) {
            if self.listening.swap(true, Ordering::SeqCst) {
                return;
            }
            let listening = self.listening.clone();
            std::thread::spawn(move || {
                let mut tick = 0u64;
                while listening.load(Ordering::Relaxed) {
                    tick += 1;
                    callback(MotionSample::at_rest(tick as f64 * 0.005).into());
                    std::thread::sleep(Duration::from_millis(5));
                }
            });
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn test_adapter_forwards_samples() {
        let adapter = SourceAdapter::new(
            "ticking".to_string(),
            Box::new(TickingSource {
                listening: Arc::new(AtomicBool::new(false)),
            }),
            BackpressureConfig::new(64, DropPolicy::DropNewest),
        );

        let (tx, rx) = bounded(64);
        let metrics = Arc::new(IngestionMetrics::new());

        adapter.start(tx, rx.clone(), metrics.clone());
        assert!(adapter.is_listening());
        assert_eq!(adapter.kind(), Some(SampleKind::Motion));

        std::thread::sleep(Duration::from_millis(60));

        adapter.stop();
        assert!(!adapter.is_listening());

        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert!(count > 0);
        assert!(metrics.snapshot().samples_received >= count);
    }
}
