//! ScoreState - aggregator output

use serde::{Deserialize, Serialize};

use crate::DrivingEvent;

/// Score ceiling, also the score of a fresh trip
pub const MAX_SCORE: u8 = 100;

/// Score floor
pub const MIN_SCORE: u8 = 0;

/// Running safety score and the events that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Current score in [0, 100]
    pub score: u8,

    /// Every ingested event, in ingestion order
    pub event_log: Vec<DrivingEvent>,
}

impl ScoreState {
    /// State of a fresh trip
    pub fn new() -> Self {
        Self {
            score: MAX_SCORE,
            event_log: Vec::new(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.event_log.len()
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.score)
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse rating band used by dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// Score above 80
    Good,
    /// Score above 50
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        if score > 80 {
            Self::Good
        } else if score > 50 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        };
        f.write_str(name)
    }
}
