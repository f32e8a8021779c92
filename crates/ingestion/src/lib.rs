//! # Ingestion Pipeline
//!
//! Sample ingestion module.
//!
//! Responsibilities:
//! - Producers: scripted mock trips and JSON-lines trip replay
//! - Backpressure management and drop policy
//! - Fan-in to downstream via async-channel
//! - Geofence road context lookup
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MockSampleSource};
//!
//! let mut pipeline = IngestionPipeline::new(256);
//! pipeline.register_source(Box::new(MockSampleSource::demo("mock")), None)?;
//!
//! pipeline.start_all();
//! let rx = pipeline.take_receiver().unwrap();
//! while let Ok(sample) = rx.recv().await {
//!     // Feed the engine
//! }
//! ```

mod adapter;
mod config;
mod error;
mod mock;
mod pipeline;
mod replay;
mod road;
mod send;

// Re-exports
pub use adapter::SourceAdapter;
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::Sample;
pub use error::{IngestionError, Result};
pub use mock::{generate_trip, MockSampleSource, MockScenarioConfig, ScenarioSegment};
pub use pipeline::IngestionPipeline;
pub use replay::{parse_recording, ReplayConfig, ReplaySource};
pub use road::{haversine_m, ZoneRoadProvider};
pub use send::{send_sample, SendOutcome};
