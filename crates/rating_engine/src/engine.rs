//! Driving engine facade.

use contracts::{
    ContractError, DrivingEvent, EngineConfig, MotionSample, PositionSample, RoadContext,
    RoadContextProvider, Sample, SampleKind, ScoreState, ScoredEvent,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::location::LocationEventDetector;
use crate::motion::MotionEventDetector;
use crate::score::ScoreAggregator;

/// Ingestion counters since construction or the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub motion_samples: u64,
    pub position_samples: u64,
    /// Samples skipped for NaN / infinite fields (counted in the totals above too)
    pub malformed_samples: u64,
    pub events_emitted: u64,
    /// Road lookups that failed and fell back to the unknown-road context
    pub road_lookup_failures: u64,
}

/// Composes the detectors and the score aggregator
///
/// Every event returned from an ingest call has already been applied to the
/// score. Not synchronized: wrap in [`SharedEngine`](crate::SharedEngine) when
/// several producers feed one trip.
#[derive(Debug)]
pub struct DrivingEngine {
    config: EngineConfig,
    motion: MotionEventDetector,
    location: LocationEventDetector,
    aggregator: ScoreAggregator,
    stats: EngineStats,
}

impl DrivingEngine {
    /// Build an engine, rejecting invalid thresholds
    pub fn new(config: EngineConfig) -> Result<Self, ContractError> {
        config.check()?;

        let engine = Self {
            motion: MotionEventDetector::new(config.motion),
            location: LocationEventDetector::new(config.location),
            aggregator: ScoreAggregator::new(config.scoring),
            stats: EngineStats::default(),
            config,
        };
        metrics::gauge!("driver_rating_score").set(f64::from(engine.score()));
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(
        level = "trace",
        name = "rating_engine_ingest_motion",
        skip(self, sample),
        fields(timestamp = sample.timestamp)
    )]
    pub fn ingest_motion(&mut self, sample: &MotionSample) -> Vec<DrivingEvent> {
        let events = self.detect_motion(sample);
        self.apply(events)
    }

    #[instrument(
        level = "trace",
        name = "rating_engine_ingest_position",
        skip(self, sample, ctx),
        fields(timestamp = sample.timestamp, speed_mps = sample.speed_mps)
    )]
    pub fn ingest_position(
        &mut self,
        sample: &PositionSample,
        ctx: &RoadContext,
    ) -> Vec<DrivingEvent> {
        let events = self.detect_position(sample, ctx);
        self.apply(events)
    }

    /// Look up the road for this fix, then ingest it
    ///
    /// A failed lookup degrades to the unknown-road context.
    pub fn ingest_position_from(
        &mut self,
        sample: &PositionSample,
        provider: &dyn RoadContextProvider,
    ) -> Vec<DrivingEvent> {
        let events = self.detect_position_from(sample, provider);
        self.apply(events)
    }

    /// Dispatch by sample kind
    pub fn ingest(&mut self, sample: &Sample, provider: &dyn RoadContextProvider) -> Vec<DrivingEvent> {
        match sample {
            Sample::Motion(motion) => self.ingest_motion(motion),
            Sample::Position(position) => self.ingest_position_from(position, provider),
        }
    }

    /// Like [`ingest`](Self::ingest), pairing each event with its log
    /// sequence and the score it left behind
    pub fn ingest_scored(
        &mut self,
        sample: &Sample,
        provider: &dyn RoadContextProvider,
    ) -> Vec<ScoredEvent> {
        let events = match sample {
            Sample::Motion(motion) => self.detect_motion(motion),
            Sample::Position(position) => self.detect_position_from(position, provider),
        };
        self.apply_scored(events)
    }

    /// Snapshot of the score and event log
    pub fn current_state(&self) -> ScoreState {
        self.aggregator.state().clone()
    }

    pub fn score(&self) -> u8 {
        self.aggregator.score()
    }

    pub fn event_count(&self) -> usize {
        self.aggregator.state().event_count()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Start a new trip: full score, empty log, detector history dropped
    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.motion.reset();
        self.location.reset();
        self.stats = EngineStats::default();
        metrics::gauge!("driver_rating_score").set(f64::from(self.score()));
        debug!("engine reset");
    }

    fn detect_motion(&mut self, sample: &MotionSample) -> Vec<DrivingEvent> {
        self.stats.motion_samples += 1;
        metrics::counter!("driver_rating_samples_total", "kind" => "motion").increment(1);

        if let Err(e) = sample.check_finite() {
            self.record_malformed(SampleKind::Motion, &e);
            return Vec::new();
        }
        self.motion.on_motion_sample(sample)
    }

    fn detect_position(&mut self, sample: &PositionSample, ctx: &RoadContext) -> Vec<DrivingEvent> {
        if !self.admit_position(sample) {
            return Vec::new();
        }
        self.location.on_position_sample(sample, ctx)
    }

    /// Malformed fixes are rejected before the provider sees them
    fn detect_position_from(
        &mut self,
        sample: &PositionSample,
        provider: &dyn RoadContextProvider,
    ) -> Vec<DrivingEvent> {
        if !self.admit_position(sample) {
            return Vec::new();
        }
        let ctx = self.road_context(sample, provider);
        self.location.on_position_sample(sample, &ctx)
    }

    fn admit_position(&mut self, sample: &PositionSample) -> bool {
        self.stats.position_samples += 1;
        metrics::counter!("driver_rating_samples_total", "kind" => "position").increment(1);

        match sample.check_finite() {
            Ok(()) => true,
            Err(e) => {
                self.record_malformed(SampleKind::Position, &e);
                false
            }
        }
    }

    fn road_context(
        &mut self,
        sample: &PositionSample,
        provider: &dyn RoadContextProvider,
    ) -> RoadContext {
        match provider.lookup(sample.latitude, sample.longitude) {
            Ok(ctx) => ctx,
            Err(e) => {
                self.stats.road_lookup_failures += 1;
                metrics::counter!("driver_rating_road_lookup_failures_total").increment(1);
                warn!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    error = %e,
                    "road lookup failed, using unknown-road context"
                );
                RoadContext::default()
            }
        }
    }

    fn apply(&mut self, events: Vec<DrivingEvent>) -> Vec<DrivingEvent> {
        self.apply_scored(events)
            .into_iter()
            .map(|scored| scored.event)
            .collect()
    }

    fn apply_scored(&mut self, events: Vec<DrivingEvent>) -> Vec<ScoredEvent> {
        let mut scored = Vec::with_capacity(events.len());

        for event in events {
            let state = self.aggregator.ingest(event.clone());
            let (sequence, score_after) = (state.event_count() as u64, state.score);
            self.stats.events_emitted += 1;

            warn!(
                kind = %event.kind,
                timestamp = event.timestamp,
                magnitude = event.magnitude,
                score = score_after,
                "{}",
                event
            );
            metrics::counter!("driver_rating_events_total", "kind" => event.kind.as_str())
                .increment(1);
            metrics::histogram!("driver_rating_event_magnitude", "kind" => event.kind.as_str())
                .record(event.magnitude.abs());

            scored.push(ScoredEvent {
                sequence,
                event,
                score_after,
            });
        }
        if !scored.is_empty() {
            metrics::gauge!("driver_rating_score").set(f64::from(self.score()));
        }
        scored
    }

    fn record_malformed(&mut self, kind: SampleKind, error: &ContractError) {
        self.stats.malformed_samples += 1;
        metrics::counter!("driver_rating_malformed_samples_total", "kind" => kind.as_str())
            .increment(1);
        debug!(kind = %kind, error = %error, "skipping malformed sample");
    }
}
