//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: sample
//! and event types, the score state, producer / road / sink traits and the
//! configuration model. Business crates depend on this crate only, reverse
//! dependencies are prohibited.
//!
//! ## Time Model
//! - Sample timestamps are seconds (f64) in the producer's clock
//! - Events carry the timestamp of the sample that triggered them

mod blueprint;
mod engine_config;
mod error;
mod event;
mod road;
mod sample;
mod sample_source;
mod score;
mod sink;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use event::*;
pub use road::*;
pub use sample::*;
pub use sample_source::{SampleCallback, SampleSource};
pub use score::*;
pub use sink::*;
