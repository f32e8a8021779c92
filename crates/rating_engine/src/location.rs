//! Location event detection from position fixes and road context.

use contracts::{DrivingEvent, EventKind, PositionSample, RoadContext, SpeedLimits};
use tracing::trace;

use crate::history::PositionHistory;

/// Wrong-way driving hook
///
/// Receives the recent position history and the current road context. No
/// heading rule is defined yet, so this never fires.
// TODO: compare bearing trend against `ctx.expected_heading_deg` once
// providers populate it.
pub fn detect_wrong_way(_history: &PositionHistory, _ctx: &RoadContext) -> Option<DrivingEvent> {
    None
}

/// Classifies position fixes into overspeeding events
///
/// Narrow-lane overspeeding takes precedence; a fix never produces both
/// speeding kinds.
#[derive(Debug)]
pub struct LocationEventDetector {
    limits: SpeedLimits,
    history: PositionHistory,
}

impl LocationEventDetector {
    pub fn new(limits: SpeedLimits) -> Self {
        Self {
            history: PositionHistory::new(limits.heading_history_len),
            limits,
        }
    }

    pub fn limits(&self) -> &SpeedLimits {
        &self.limits
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    /// Evaluate one fix against the road it was taken on
    ///
    /// Malformed fixes produce no events and are not added to the history.
    pub fn on_position_sample(
        &mut self,
        sample: &PositionSample,
        ctx: &RoadContext,
    ) -> Vec<DrivingEvent> {
        if sample.check_finite().is_err() {
            return Vec::new();
        }

        self.history.push(*sample);

        let mut events = Vec::new();
        if let Some(event) = self.check_speed(sample, ctx) {
            events.push(event);
        }
        if let Some(event) = detect_wrong_way(&self.history, ctx) {
            events.push(event);
        }

        trace!(
            timestamp = sample.timestamp,
            speed_mps = sample.speed_mps,
            narrow = ctx.is_narrow_lane,
            events = events.len(),
            "position sample evaluated"
        );
        events
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn check_speed(&self, sample: &PositionSample, ctx: &RoadContext) -> Option<DrivingEvent> {
        let speed = sample.speed_mps;
        let kmh = sample.speed_kmh();

        if ctx.is_narrow_lane && speed > self.limits.narrow_limit_mps() {
            return Some(DrivingEvent::new(
                EventKind::OverspeedingNarrow,
                sample.timestamp,
                format!("Speeding in narrow lane: {kmh} km/h"),
                speed as f64,
            ));
        }

        // A missing or unusable legal speed falls back to the highway limit
        let limit = ctx
            .legal_speed_mps
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or_else(|| self.limits.highway_limit_mps());
        (speed > limit).then(|| {
            DrivingEvent::new(
                EventKind::Overspeeding,
                sample.timestamp,
                format!("High speed detected: {kmh} km/h"),
                speed as f64,
            )
        })
    }
}

impl Default for LocationEventDetector {
    fn default() -> Self {
        Self::new(SpeedLimits::default())
    }
}
