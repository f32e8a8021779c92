//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::TripMetricsAggregator;

/// Why the consumer loop ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// Every producer finished and the queue drained
    #[default]
    TripEnded,
    /// `--max-events` reached
    MaxEvents,
    Timeout,
    /// Ctrl+C or SIGTERM
    Interrupted,
    /// Dispatcher input closed early
    DispatcherClosed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::TripEnded => "trip ended",
            Self::MaxEvents => "event limit reached",
            Self::Timeout => "timed out",
            Self::Interrupted => "interrupted",
            Self::DispatcherClosed => "dispatcher closed",
        };
        f.write_str(reason)
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Producer feeding the trip
    pub source_id: String,

    /// Total duration of the pipeline run
    pub duration: Duration,

    pub stop_reason: StopReason,

    /// Number of sinks that received data
    pub active_sinks: usize,

    /// Trip metrics aggregator
    pub trip: TripMetricsAggregator,

    pub ingestion: ingestion::MetricsSnapshot,

    /// Final per-sink counters
    pub sinks: dispatcher::SinkReport,
}

impl PipelineStats {
    pub fn samples_processed(&self) -> u64 {
        self.trip.motion_samples + self.trip.position_samples
    }

    /// Engine throughput (samples per second of wall time)
    pub fn samples_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_processed() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = self.trip.summary();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                        Trip Summary                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("🏁 Score");
        println!("   ├─ Final score: {} ({})", summary.final_score, summary.band);
        println!("   ├─ Events: {}", summary.total_events);
        println!("   └─ Events per hour: {:.1}", summary.events_per_hour);

        println!("\n🚦 Events by kind");
        let per_kind: Vec<_> = summary.per_kind.iter().filter(|k| k.count > 0).collect();
        if per_kind.is_empty() {
            println!("   └─ none");
        }
        for (i, kind) in per_kind.iter().enumerate() {
            let prefix = if i == per_kind.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {}: {} (magnitude {})",
                prefix, kind.kind, kind.count, kind.magnitude
            );
        }

        println!("\n📊 Samples");
        println!("   ├─ Source: {}", self.source_id);
        println!("   ├─ Trip time: {:.1}s", summary.trip_duration_s);
        println!(
            "   ├─ Motion / position: {} / {}",
            summary.motion_samples, summary.position_samples
        );
        println!("   ├─ Speed (km/h): {}", summary.speed_kmh);
        println!("   ├─ Malformed: {}", summary.malformed_samples);
        println!("   ├─ Road lookup failures: {}", summary.road_lookup_failures);
        println!(
            "   ├─ Dropped by backpressure: {}",
            self.ingestion.samples_dropped
        );
        println!("   └─ Throughput: {:.1} samples/s", self.samples_per_sec());

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks ({})", self.sinks.len());
            for (i, (name, snapshot)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed, {} dropped ({:.0}% delivered)",
                    prefix,
                    name,
                    snapshot.write_count,
                    snapshot.failure_count,
                    snapshot.dropped_count,
                    snapshot.delivery_ratio() * 100.0
                );
            }
        }

        println!(
            "\nStopped after {:.2}s: {}\n",
            self.duration.as_secs_f64(),
            self.stop_reason
        );
    }
}
