//! SampleSource trait - Producer abstraction
//!
//! Decouples the engine from any platform callback mechanism. Mock
//! generators, trip replays and device bindings all implement this trait.

use std::sync::Arc;

use crate::{Sample, SampleKind};

/// Sample callback type
///
/// When a producer has a reading, it delivers `Sample` through this callback.
/// Uses `Arc` to allow callback sharing across multiple contexts.
pub type SampleCallback = Arc<dyn Fn(Sample) + Send + Sync>;

/// Sample producer trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SampleSource> = get_source();
/// source.listen(Arc::new(|sample| {
///     println!("received {} sample", sample.kind());
/// }));
/// // ... drive ...
/// source.stop();
/// ```
pub trait SampleSource: Send + Sync {
    /// Producer ID
    fn source_id(&self) -> &str;

    /// Kind of samples this producer delivers
    ///
    /// `None` for producers that interleave both kinds (e.g. a trip replay).
    fn kind(&self) -> Option<SampleKind>;

    /// Register sample callback
    ///
    /// Repeated calls while listening are idempotent (the first callback wins).
    fn listen(&self, callback: SampleCallback);

    /// Stop producing samples
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
