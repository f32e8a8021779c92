//! Thread-safe engine handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    DrivingEvent, MotionSample, PositionSample, RoadContext, RoadContextProvider, Sample,
    ScoreState, ScoredEvent,
};

use crate::engine::{DrivingEngine, EngineStats};

/// Cloneable handle serializing access to one [`DrivingEngine`]
///
/// Each call holds the lock for its whole read-modify-write, so motion and
/// position producers on different threads never interleave inside the
/// aggregator.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<DrivingEngine>>,
}

impl SharedEngine {
    pub fn new(engine: DrivingEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // A panic while holding the lock cannot leave the score half-applied:
    // the aggregator mutates score and log in one call.
    fn lock(&self) -> MutexGuard<'_, DrivingEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ingest_motion(&self, sample: &MotionSample) -> Vec<DrivingEvent> {
        self.lock().ingest_motion(sample)
    }

    pub fn ingest_position(&self, sample: &PositionSample, ctx: &RoadContext) -> Vec<DrivingEvent> {
        self.lock().ingest_position(sample, ctx)
    }

    pub fn ingest_position_from(
        &self,
        sample: &PositionSample,
        provider: &dyn RoadContextProvider,
    ) -> Vec<DrivingEvent> {
        self.lock().ingest_position_from(sample, provider)
    }

    pub fn ingest(&self, sample: &Sample, provider: &dyn RoadContextProvider) -> Vec<DrivingEvent> {
        self.lock().ingest(sample, provider)
    }

    /// Ingest and number the events under one lock
    pub fn ingest_scored(
        &self,
        sample: &Sample,
        provider: &dyn RoadContextProvider,
    ) -> Vec<ScoredEvent> {
        self.lock().ingest_scored(sample, provider)
    }

    pub fn current_state(&self) -> ScoreState {
        self.lock().current_state()
    }

    pub fn score(&self) -> u8 {
        self.lock().score()
    }

    pub fn stats(&self) -> EngineStats {
        self.lock().stats()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }
}

impl From<DrivingEngine> for SharedEngine {
    fn from(engine: DrivingEngine) -> Self {
        Self::new(engine)
    }
}
