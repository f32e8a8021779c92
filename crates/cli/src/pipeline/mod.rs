//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, TripSource};
pub use stats::{PipelineStats, StopReason};
