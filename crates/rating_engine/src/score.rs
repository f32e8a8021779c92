//! Score aggregation.

use contracts::{DrivingEvent, ScoreState, ScoringPolicy, MAX_SCORE};

/// Owns the trip's `ScoreState`
///
/// The only place the score or the event log change.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    policy: ScoringPolicy,
    state: ScoreState,
}

impl ScoreAggregator {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            state: ScoreState::new(),
        }
    }

    /// Apply one event: deduct the penalty, floor at 0, append to the log
    pub fn ingest(&mut self, event: DrivingEvent) -> &ScoreState {
        self.state.score = self.state.score.saturating_sub(self.policy.penalty);
        self.state.event_log.push(event);
        &self.state
    }

    /// Start a new trip
    pub fn reset(&mut self) -> &ScoreState {
        self.state.score = MAX_SCORE;
        self.state.event_log.clear();
        &self.state
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn score(&self) -> u8 {
        self.state.score
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EventKind;

    fn event(kind: EventKind) -> DrivingEvent {
        DrivingEvent::new(kind, 0.0, "test", 0.0)
    }

    #[test]
    fn test_uniform_penalty() {
        let mut aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.ingest(event(EventKind::SuddenBraking)).score, 95);
        assert_eq!(aggregator.ingest(event(EventKind::Overspeeding)).score, 90);
        assert_eq!(aggregator.state().event_count(), 2);
    }

    #[test]
    fn test_floor_at_zero_keeps_logging() {
        let mut aggregator = ScoreAggregator::default();
        for _ in 0..20 {
            aggregator.ingest(event(EventKind::ZigZag));
        }
        assert_eq!(aggregator.score(), 0);

        let state = aggregator.ingest(event(EventKind::RashDriving));
        assert_eq!(state.score, 0);
        assert_eq!(state.event_log.len(), 21);
        assert_eq!(state.event_log[20].kind, EventKind::RashDriving);
    }

    #[test]
    fn test_large_penalty_clamps() {
        let mut aggregator = ScoreAggregator::new(ScoringPolicy { penalty: 30 });
        for _ in 0..4 {
            aggregator.ingest(event(EventKind::ZigZag));
        }
        assert_eq!(aggregator.score(), 0);
    }

    #[test]
    fn test_reset() {
        let mut aggregator = ScoreAggregator::default();
        aggregator.ingest(event(EventKind::WrongWay));
        let state = aggregator.reset();
        assert_eq!(state.score, 100);
        assert!(state.event_log.is_empty());
    }
}
