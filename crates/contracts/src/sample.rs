//! Samples - acquisition layer output
//!
//! Raw motion and position readings as delivered by a producer.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Kind of sample a producer delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Motion,
    Position,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Position => "position",
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accelerometer + gyroscope reading
///
/// Assumes a fixed, forward-facing mount: `accel_y` is the longitudinal axis
/// and a negative value is deceleration. No tilt compensation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Sample timestamp (seconds)
    pub timestamp: f64,

    /// Lateral acceleration (m/s²)
    pub accel_x: f32,

    /// Longitudinal acceleration (m/s²)
    pub accel_y: f32,

    /// Vertical acceleration (m/s²), ~9.8 at rest
    pub accel_z: f32,

    /// Yaw rate (rad/s)
    pub gyro_z: f32,
}

impl MotionSample {
    /// Sample of a vehicle standing still
    pub fn at_rest(timestamp: f64) -> Self {
        Self {
            timestamp,
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 9.8,
            gyro_z: 0.0,
        }
    }

    /// Reject samples with NaN or infinite fields
    pub fn check_finite(&self) -> Result<(), ContractError> {
        let fields = [
            ("timestamp", self.timestamp.is_finite()),
            ("accel_x", self.accel_x.is_finite()),
            ("accel_y", self.accel_y.is_finite()),
            ("accel_z", self.accel_z.is_finite()),
            ("gyro_z", self.gyro_z.is_finite()),
        ];
        first_non_finite(SampleKind::Motion, &fields)
    }
}

/// GPS / fused location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Fix timestamp (seconds)
    pub timestamp: f64,

    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,

    /// Ground speed (m/s), trusted as reported
    pub speed_mps: f32,

    /// Course over ground (degrees)
    pub bearing_deg: f32,

    /// Horizontal accuracy (meters)
    pub accuracy_m: f32,
}

impl PositionSample {
    /// Ground speed in km/h
    pub fn speed_kmh(&self) -> f32 {
        self.speed_mps * 3.6
    }

    /// Reject samples with NaN or infinite fields
    pub fn check_finite(&self) -> Result<(), ContractError> {
        let fields = [
            ("timestamp", self.timestamp.is_finite()),
            ("latitude", self.latitude.is_finite()),
            ("longitude", self.longitude.is_finite()),
            ("speed_mps", self.speed_mps.is_finite()),
            ("bearing_deg", self.bearing_deg.is_finite()),
            ("accuracy_m", self.accuracy_m.is_finite()),
        ];
        first_non_finite(SampleKind::Position, &fields)
    }
}

fn first_non_finite(kind: SampleKind, fields: &[(&str, bool)]) -> Result<(), ContractError> {
    match fields.iter().find(|(_, finite)| !finite) {
        Some((field, _)) => Err(ContractError::malformed_sample(kind.as_str(), *field)),
        None => Ok(()),
    }
}

/// A single reading from any producer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sample {
    Motion(MotionSample),
    Position(PositionSample),
}

impl Sample {
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::Motion(_) => SampleKind::Motion,
            Self::Position(_) => SampleKind::Position,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Motion(s) => s.timestamp,
            Self::Position(s) => s.timestamp,
        }
    }
}

impl From<MotionSample> for Sample {
    fn from(sample: MotionSample) -> Self {
        Self::Motion(sample)
    }
}

impl From<PositionSample> for Sample {
    fn from(sample: PositionSample) -> Self {
        Self::Position(sample)
    }
}
