//! Pipeline orchestrator - coordinates all components.
//!
//! One producer feeds the ingestion channel, a single consumer runs every
//! sample through the engine, and scored events fan out through the
//! dispatcher.

use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_channel::Receiver;
use contracts::{RatingBlueprint, Sample, SampleSource, ScoredEvent};
use ingestion::{
    IngestionPipeline, MockSampleSource, MockScenarioConfig, ReplayConfig, ReplaySource,
    ZoneRoadProvider,
};
use observability::FaultCounters;
use rating_engine::{DrivingEngine, SharedEngine};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{PipelineStats, StopReason};
use crate::error::CliError;

/// How long the consumer waits on an empty queue before checking producers
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Grace period for sinks to drain after the trip ends
const DISPATCHER_DRAIN: Duration = Duration::from_secs(5);

/// Where the trip's samples come from
#[derive(Debug, Clone)]
pub enum TripSource {
    /// Built-in scripted trip
    Scripted(MockScenarioConfig),
    /// JSON-lines recording
    Replay { path: PathBuf, config: ReplayConfig },
}

impl TripSource {
    fn build(&self) -> std::result::Result<Box<dyn SampleSource>, CliError> {
        match self {
            Self::Scripted(config) => {
                let source = MockSampleSource::new("scripted_trip", config.clone())
                    .map_err(|e| CliError::source_setup("scripted_trip", e))?;
                Ok(Box::new(source))
            }
            Self::Replay { path, config } => {
                let source = ReplaySource::load(path, *config)
                    .map_err(|e| CliError::source_setup(path.display().to_string(), e))?;
                if source.is_empty() {
                    warn!(path = %path.display(), "Recording contains no samples");
                }
                Ok(Box::new(source))
            }
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub blueprint: RatingBlueprint,

    pub source: TripSource,

    /// Stop after this many events (None = unlimited)
    pub max_events: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the trip to completion, or until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let engine = DrivingEngine::new(blueprint.engine.clone())
            .context("Failed to build driving engine")?;
        let engine = SharedEngine::new(engine);
        let provider = ZoneRoadProvider::from_config(&blueprint.road);

        info!(
            zones = provider.zones().len(),
            narrow_zones = blueprint.narrow_zone_count(),
            penalty = blueprint.engine.scoring.penalty,
            "Driving engine configured"
        );

        // Ingestion
        let mut ingestion = IngestionPipeline::new(self.config.buffer_size);
        let source = self.config.source.build()?;
        let source_id = source.source_id().to_string();
        ingestion
            .register_source(source, None)
            .context("Failed to register sample source")?;

        // Dispatcher
        let (event_tx, event_rx) = mpsc::channel::<ScoredEvent>(self.config.buffer_size);
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - scored events will only be logged by the engine");
        }
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), event_rx)
            .context("Failed to create dispatcher")?;
        let active_sinks = dispatcher.sink_count();
        let dispatcher_handle = dispatcher.spawn();

        info!(active_sinks, "Dispatcher started");

        ingestion.start_all();
        let samples_rx = ingestion
            .take_receiver()
            .ok_or_else(|| CliError::pipeline_execution("ingestion receiver already taken"))?;

        info!(source_id = %source_id, max_events = ?self.config.max_events, "Pipeline running");

        let mut stats = PipelineStats {
            source_id,
            active_sinks,
            ..Default::default()
        };

        let timeout = self.config.timeout;
        let consumer = consume(
            &ingestion,
            &samples_rx,
            &engine,
            &provider,
            &event_tx,
            self.config.max_events,
            &mut stats,
        );
        let bounded = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, consumer).await.unwrap_or_else(|_| {
                    warn!(timeout_secs = limit.as_secs(), "Pipeline timed out");
                    StopReason::Timeout
                }),
                None => consumer.await,
            }
        };

        let stop_reason = tokio::select! {
            reason = bounded => reason,
            _ = shutdown => {
                warn!("Received shutdown signal, stopping pipeline...");
                StopReason::Interrupted
            }
        };
        stats.stop_reason = stop_reason;

        // Shutdown
        info!(reason = %stop_reason, "Shutting down pipeline...");
        ingestion.stop_all();
        drop(event_tx);

        match tokio::time::timeout(DISPATCHER_DRAIN, dispatcher_handle).await {
            Ok(Ok(sinks)) => stats.sinks = sinks,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!(
                timeout_secs = DISPATCHER_DRAIN.as_secs(),
                "Dispatcher did not drain in time"
            ),
        }

        let engine_stats = engine.stats();
        stats.trip.set_faults(FaultCounters {
            malformed_samples: engine_stats.malformed_samples,
            road_lookup_failures: engine_stats.road_lookup_failures,
        });
        stats.ingestion = ingestion.metrics().snapshot();
        stats.duration = start_time.elapsed();

        let summary = stats.trip.summary();
        observability::record_trip_completed(&summary);

        info!(
            score = summary.final_score,
            band = %summary.band,
            events = summary.total_events,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Drain the ingestion queue through the engine until the trip ends
#[instrument(name = "pipeline_consume", skip_all)]
async fn consume(
    ingestion: &IngestionPipeline,
    samples: &Receiver<Sample>,
    engine: &SharedEngine,
    provider: &ZoneRoadProvider,
    events: &mpsc::Sender<ScoredEvent>,
    max_events: Option<u64>,
    stats: &mut PipelineStats,
) -> StopReason {
    loop {
        let sample = match tokio::time::timeout(IDLE_POLL, samples.recv()).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(_)) => return StopReason::TripEnded,
            Err(_) => {
                if ingestion.all_finished() && samples.is_empty() {
                    debug!("All producers finished and queue drained");
                    return StopReason::TripEnded;
                }
                continue;
            }
        };

        stats.trip.record_sample(&sample);
        observability::record_queue_depth(samples.len());

        // The engine has scored the whole batch; sinks must see all of it
        for scored in engine.ingest_scored(&sample, provider) {
            stats.trip.update(&scored);

            let kind = scored.event.kind;
            let accepted = events.send(scored).await.is_ok();
            observability::record_event_dispatched(kind, accepted);
            if !accepted {
                warn!("Dispatcher channel closed");
                return StopReason::DispatcherClosed;
            }
        }

        if let Some(max) = max_events {
            if stats.trip.total_events >= max {
                info!(events = stats.trip.total_events, "Reached max events limit");
                return StopReason::MaxEvents;
            }
        }
    }
}
