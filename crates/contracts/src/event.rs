//! DrivingEvent - detector output
//!
//! Classified driving-behavior occurrences and the score record handed to sinks.

use serde::{Deserialize, Serialize};

/// Detector that owns an event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Accelerometer / gyroscope rules
    Motion,
    /// Speed / road context rules
    Location,
}

/// Closed set of event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SuddenBraking,
    RashDriving,
    ZigZag,
    OverspeedingNarrow,
    Overspeeding,
    WrongWay,
}

impl EventKind {
    /// All kinds, in declaration order
    pub const ALL: [EventKind; 6] = [
        EventKind::SuddenBraking,
        EventKind::RashDriving,
        EventKind::ZigZag,
        EventKind::OverspeedingNarrow,
        EventKind::Overspeeding,
        EventKind::WrongWay,
    ];

    /// Wire / log name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuddenBraking => "SUDDEN_BRAKING",
            Self::RashDriving => "RASH_DRIVING",
            Self::ZigZag => "ZIG_ZAG",
            Self::OverspeedingNarrow => "OVERSPEEDING_NARROW",
            Self::Overspeeding => "OVERSPEEDING",
            Self::WrongWay => "WRONG_WAY",
        }
    }

    /// The single detector that may emit this kind
    pub fn source(&self) -> EventSource {
        match self {
            Self::SuddenBraking | Self::RashDriving | Self::ZigZag => EventSource::Motion,
            Self::OverspeedingNarrow | Self::Overspeeding | Self::WrongWay => {
                EventSource::Location
            }
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified driving event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingEvent {
    /// Event kind
    pub kind: EventKind,

    /// Timestamp of the sample that triggered detection (seconds)
    pub timestamp: f64,

    /// Human-readable description
    pub message: String,

    /// Raw value that crossed the threshold (m/s², rad/s or m/s)
    pub magnitude: f64,
}

impl DrivingEvent {
    pub fn new(kind: EventKind, timestamp: f64, message: impl Into<String>, magnitude: f64) -> Self {
        Self {
            kind,
            timestamp,
            message: message.into(),
            magnitude,
        }
    }

    pub fn source(&self) -> EventSource {
        self.kind.source()
    }
}

impl std::fmt::Display for DrivingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Event plus the score it left behind
///
/// Produced by the embedding application after each ingest call and fanned
/// out to sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvent {
    /// 1-based position in the trip's event log
    pub sequence: u64,

    /// The event
    pub event: DrivingEvent,

    /// Score after this event was applied
    pub score_after: u8,
}
