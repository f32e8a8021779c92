//! Ingestion Pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{Sample, SampleSource};
use tracing::{debug, info, instrument};

use crate::adapter::SourceAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};

/// Ingestion Pipeline
///
/// Fans every registered producer into one bounded channel.
pub struct IngestionPipeline {
    adapters: HashMap<String, SourceAdapter>,

    metrics: Arc<IngestionMetrics>,

    /// Shared by all adapters
    tx: Sender<Sample>,

    /// Kept for `DropOldest` eviction even after the consumer takes its receiver
    evict: Receiver<Sample>,

    rx: Option<Receiver<Sample>>,

    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            evict: rx.clone(),
            rx: Some(rx),
            default_config: config,
        }
    }

    /// Register a producer under its `source_id`
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source_id = %source.source_id())
    )]
    pub fn register_source(
        &mut self,
        source: Box<dyn SampleSource>,
        config: Option<BackpressureConfig>,
    ) -> Result<()> {
        let source_id = source.source_id().to_string();
        if self.adapters.contains_key(&source_id) {
            return Err(IngestionError::AlreadyRegistered { source_id });
        }

        let adapter = SourceAdapter::new(
            source_id.clone(),
            source,
            config.unwrap_or_else(|| self.default_config.clone()),
        );
        debug!(source_id = %source_id, kind = ?adapter.kind(), "registered sample source");
        self.adapters.insert(source_id, adapter);
        Ok(())
    }

    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sample sources");
        for adapter in self.adapters.values() {
            if !adapter.is_listening() {
                adapter.start(self.tx.clone(), self.evict.clone(), self.metrics.clone());
            }
        }
    }

    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all sample sources");
        for adapter in self.adapters.values() {
            adapter.stop();
        }
    }

    /// Data stream receiver; only the first call returns `Some`
    pub fn take_receiver(&mut self) -> Option<Receiver<Sample>> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_source_listening(&self, source_id: &str) -> bool {
        self.adapters
            .get(source_id)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }

    /// True once every producer has finished or been stopped
    pub fn all_finished(&self) -> bool {
        self.adapters.values().all(|a| !a.is_listening())
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropPolicy;
    use crate::replay::{ReplayConfig, ReplaySource};
    use contracts::{MotionSample, PositionSample, SampleKind};
    use std::time::Duration;

    fn replay(id: &str, samples: Vec<Sample>) -> Box<dyn SampleSource> {
        Box::new(ReplaySource::from_samples(
            id,
            samples,
            ReplayConfig {
                speed_multiplier: 0.0,
                loop_playback: false,
            },
        ))
    }

    fn motion(n: usize) -> Vec<Sample> {
        (0..n).map(|i| MotionSample::at_rest(i as f64).into()).collect()
    }

    fn positions(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                PositionSample {
                    timestamp: i as f64,
                    latitude: 0.0,
                    longitude: 0.0,
                    speed_mps: 10.0,
                    bearing_deg: 0.0,
                    accuracy_m: 3.0,
                }
                .into()
            })
            .collect()
    }

    #[test]
    fn test_pipeline_creation() {
        let pipeline = IngestionPipeline::new(100);
        assert_eq!(pipeline.source_count(), 0);
        assert!(pipeline.all_finished());
    }

    #[test]
    fn test_take_receiver_once() {
        let mut pipeline = IngestionPipeline::new(100);
        assert!(pipeline.take_receiver().is_some());
        assert!(pipeline.take_receiver().is_none());
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let mut pipeline = IngestionPipeline::new(10);
        pipeline.register_source(replay("imu", motion(1)), None).unwrap();
        let err = pipeline.register_source(replay("imu", motion(1)), None).unwrap_err();
        assert!(matches!(err, IngestionError::AlreadyRegistered { .. }));
    }

    #[tokio::test]
    async fn test_fan_in_two_producers() {
        let mut pipeline = IngestionPipeline::new(256);
        pipeline.register_source(replay("imu", motion(20)), None).unwrap();
        pipeline.register_source(replay("gps", positions(5)), None).unwrap();
        let rx = pipeline.take_receiver().unwrap();

        pipeline.start_all();

        let mut motion_count = 0;
        let mut position_count = 0;
        for _ in 0..25 {
            let sample = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            match sample.kind() {
                SampleKind::Motion => motion_count += 1,
                SampleKind::Position => position_count += 1,
            }
        }
        assert_eq!((motion_count, position_count), (20, 5));
        assert_eq!(pipeline.metrics().snapshot().samples_received, 25);
    }

    #[tokio::test]
    async fn test_backpressure_drops_newest() {
        let mut pipeline = IngestionPipeline::with_config(BackpressureConfig::new(
            4,
            DropPolicy::DropNewest,
        ));
        pipeline.register_source(replay("imu", motion(10)), None).unwrap();
        let rx = pipeline.take_receiver().unwrap();

        pipeline.start_all();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snap = pipeline.metrics().snapshot();
        assert_eq!(snap.samples_received, 10);
        assert_eq!(snap.samples_dropped, 6);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.timestamp(), 0.0);
    }
}
