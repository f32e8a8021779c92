//! # Rating Engine
//!
//! Driving event detection and trip scoring.
//!
//! - `MotionEventDetector`: hard braking, rash driving, zig-zag from IMU samples
//! - `LocationEventDetector`: overspeeding against the road context
//! - `ScoreAggregator`: uniform penalty per event, floored at 0
//! - `DrivingEngine`: one entry point per sample kind
//!
//! ## Usage
//!
//! ```ignore
//! use rating_engine::{DrivingEngine, EngineConfig};
//!
//! let mut engine = DrivingEngine::new(EngineConfig::default())?;
//!
//! for event in engine.ingest_motion(&sample) {
//!     println!("{event} -> score {}", engine.score());
//! }
//! ```

mod engine;
mod history;
mod location;
mod motion;
mod score;
mod shared;

pub use engine::{DrivingEngine, EngineStats};
pub use history::PositionHistory;
pub use location::{detect_wrong_way, LocationEventDetector};
pub use motion::{total_force, MotionEventDetector};
pub use score::ScoreAggregator;
pub use shared::SharedEngine;

// Re-export contracts types
pub use contracts::{
    DrivingEvent, EngineConfig, EventKind, MotionSample, MotionThresholds, PositionSample,
    RoadContext, ScoreState, ScoredEvent, ScoringPolicy, SpeedLimits,
};
