//! LogSink - reports scored events via tracing

use contracts::{ContractError, EventSink, ScoredEvent};
use tracing::{info, instrument};

/// Sink that logs each event in `[KIND] message` form
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, scored),
        fields(sink = %self.name, sequence = scored.sequence)
    )]
    async fn write(&mut self, scored: &ScoredEvent) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            sequence = scored.sequence,
            kind = %scored.event.kind,
            timestamp = scored.event.timestamp,
            score = scored.score_after,
            "{}",
            scored.event
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
