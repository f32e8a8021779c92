//! Driving metrics
//!
//! Prometheus descriptions for the `driver_rating_*` series plus an in-memory
//! trip aggregator used for the end-of-run summary.

use std::collections::HashMap;

use contracts::{EventKind, Sample, SampleKind, ScoreBand, ScoredEvent, MAX_SCORE};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Register descriptions for every series the workspace records
///
/// Safe to call more than once; recorders keep the last description.
pub fn describe_metrics() {
    describe_counter!(
        "driver_rating_samples_total",
        "Samples accepted by the engine, by kind"
    );
    describe_counter!(
        "driver_rating_malformed_samples_total",
        "Samples skipped because a field was not finite"
    );
    describe_counter!("driver_rating_events_total", "Detected driving events, by kind");
    describe_gauge!("driver_rating_score", "Current trip safety score (0-100)");
    describe_histogram!(
        "driver_rating_event_magnitude",
        "Absolute value that crossed the threshold, by kind"
    );
    describe_counter!(
        "driver_rating_road_lookup_failures_total",
        "Road context lookups that fell back to the default context"
    );
    describe_counter!(
        "driver_rating_ingest_samples_total",
        "Samples delivered by producers, by kind"
    );
    describe_counter!(
        "driver_rating_ingest_dropped_total",
        "Samples dropped by ingestion backpressure, by source"
    );
    describe_counter!("driver_rating_sink_writes_total", "Successful sink writes");
    describe_counter!("driver_rating_sink_failures_total", "Failed sink writes");
    describe_counter!(
        "driver_rating_sink_dropped_total",
        "Events dropped because a sink queue was full"
    );
    describe_counter!(
        "driver_rating_events_dispatched_total",
        "Scored events handed to the dispatcher, by status"
    );
    describe_gauge!(
        "driver_rating_sink_queue_depth",
        "Events waiting in a sink queue"
    );
    describe_gauge!(
        "driver_rating_pipeline_queue_depth",
        "Samples waiting between ingestion and the engine"
    );
}

/// Record a scored event leaving the engine for the dispatcher
pub fn record_event_dispatched(kind: EventKind, accepted: bool) {
    let status = if accepted { "accepted" } else { "closed" };
    counter!(
        "driver_rating_events_dispatched_total",
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
}

/// Record the ingestion queue depth seen by the consumer
pub fn record_queue_depth(depth: usize) {
    gauge!("driver_rating_pipeline_queue_depth").set(depth as f64);
}

/// Record the trip duration once a run completes
pub fn record_trip_completed(summary: &TripSummary) {
    histogram!("driver_rating_trip_duration_s").record(summary.trip_duration_s);
    gauge!("driver_rating_score").set(f64::from(summary.final_score));
}

/// Engine-side fault counters folded into the summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounters {
    pub malformed_samples: u64,
    pub road_lookup_failures: u64,
}

/// Trip metrics aggregator
///
/// Fed every sample and every scored event of one trip.
#[derive(Debug, Clone)]
pub struct TripMetricsAggregator {
    pub motion_samples: u64,
    pub position_samples: u64,
    pub total_events: u64,
    pub final_score: u8,
    pub faults: FaultCounters,
    pub event_counts: HashMap<EventKind, u64>,
    pub magnitude_stats: HashMap<EventKind, RunningStats>,
    pub speed_stats: RunningStats,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
}

impl Default for TripMetricsAggregator {
    fn default() -> Self {
        Self {
            motion_samples: 0,
            position_samples: 0,
            total_events: 0,
            final_score: MAX_SCORE,
            faults: FaultCounters::default(),
            event_counts: HashMap::new(),
            magnitude_stats: HashMap::new(),
            speed_stats: RunningStats::default(),
            first_timestamp: None,
            last_timestamp: None,
        }
    }
}

impl TripMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a sample and extend the trip time span
    pub fn record_sample(&mut self, sample: &Sample) {
        match sample {
            Sample::Motion(_) => self.motion_samples += 1,
            Sample::Position(position) => {
                self.position_samples += 1;
                if position.speed_mps.is_finite() {
                    self.speed_stats.push(f64::from(position.speed_kmh()));
                }
            }
        }

        let ts = sample.timestamp();
        if !ts.is_finite() {
            return;
        }
        self.first_timestamp = Some(self.first_timestamp.map_or(ts, |first| first.min(ts)));
        self.last_timestamp = Some(self.last_timestamp.map_or(ts, |last| last.max(ts)));
    }

    /// Fold one scored event into the per-kind statistics
    pub fn update(&mut self, scored: &ScoredEvent) {
        let kind = scored.event.kind;
        self.total_events += 1;
        self.final_score = scored.score_after;
        *self.event_counts.entry(kind).or_insert(0) += 1;
        self.magnitude_stats
            .entry(kind)
            .or_default()
            .push(scored.event.magnitude.abs());
    }

    pub fn set_faults(&mut self, faults: FaultCounters) {
        self.faults = faults;
    }

    pub fn samples(&self, kind: SampleKind) -> u64 {
        match kind {
            SampleKind::Motion => self.motion_samples,
            SampleKind::Position => self.position_samples,
        }
    }

    /// Build the end-of-trip report
    pub fn summary(&self) -> TripSummary {
        let trip_duration_s = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        };

        let per_kind = EventKind::ALL
            .iter()
            .map(|kind| KindSummary {
                kind: *kind,
                count: self.event_counts.get(kind).copied().unwrap_or(0),
                magnitude: self
                    .magnitude_stats
                    .get(kind)
                    .map(StatsSummary::from)
                    .unwrap_or_default(),
            })
            .collect();

        TripSummary {
            motion_samples: self.motion_samples,
            position_samples: self.position_samples,
            malformed_samples: self.faults.malformed_samples,
            road_lookup_failures: self.faults.road_lookup_failures,
            total_events: self.total_events,
            final_score: self.final_score,
            band: ScoreBand::of(self.final_score),
            trip_duration_s,
            events_per_hour: if trip_duration_s > 0.0 {
                self.total_events as f64 / trip_duration_s * 3600.0
            } else {
                0.0
            },
            speed_kmh: StatsSummary::from(&self.speed_stats),
            per_kind,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-kind slice of a trip summary
#[derive(Debug, Clone, PartialEq)]
pub struct KindSummary {
    pub kind: EventKind,
    pub count: u64,
    pub magnitude: StatsSummary,
}

/// Trip summary
#[derive(Debug, Clone, PartialEq)]
pub struct TripSummary {
    pub motion_samples: u64,
    pub position_samples: u64,
    pub malformed_samples: u64,
    pub road_lookup_failures: u64,
    pub total_events: u64,
    pub final_score: u8,
    pub band: ScoreBand,
    pub trip_duration_s: f64,
    pub events_per_hour: f64,
    pub speed_kmh: StatsSummary,
    /// Every kind in declaration order, including zero counts
    pub per_kind: Vec<KindSummary>,
}

impl TripSummary {
    pub fn count_of(&self, kind: EventKind) -> u64 {
        self.per_kind
            .iter()
            .find(|k| k.kind == kind)
            .map_or(0, |k| k.count)
    }
}

impl std::fmt::Display for TripSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Trip Summary ===")?;
        writeln!(f, "Final score: {} ({})", self.final_score, self.band)?;
        writeln!(f, "Trip duration: {:.1}s", self.trip_duration_s)?;
        writeln!(
            f,
            "Samples: {} motion, {} position",
            self.motion_samples, self.position_samples
        )?;
        writeln!(f, "Malformed samples: {}", self.malformed_samples)?;
        writeln!(f, "Road lookup failures: {}", self.road_lookup_failures)?;
        writeln!(
            f,
            "Events: {} ({:.1}/h)",
            self.total_events, self.events_per_hour
        )?;
        writeln!(f, "Speed (km/h): {}", self.speed_kmh)?;

        for kind in self.per_kind.iter().filter(|k| k.count > 0) {
            writeln!(f, "  {}: {} | {}", kind.kind, kind.count, kind.magnitude)?;
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
