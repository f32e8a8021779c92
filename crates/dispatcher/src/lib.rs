//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 消费 `ScoredEvent`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞主链路

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{EventSink, ScoredEvent};
pub use dispatcher::{create_dispatcher, Dispatcher, SinkReport};
pub use error::DispatcherError;
pub use handle::{Delivery, SinkHandle};
pub use crate::metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
