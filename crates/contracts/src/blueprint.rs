//! RatingBlueprint - Config Loader output
//!
//! Describes a complete rating setup: engine thresholds, road geofences and
//! output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::EngineConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete rating configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Detection and scoring thresholds
    #[serde(default)]
    pub engine: EngineConfig,

    /// Road knowledge used by the geofence provider
    #[serde(default)]
    pub road: RoadConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Road knowledge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadConfig {
    /// Circular geofences, first match wins
    #[serde(default)]
    pub zones: Vec<RoadZone>,
}

/// Circular geofence with road attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadZone {
    /// Unique zone name
    pub name: String,

    /// Center latitude (degrees)
    pub latitude: f64,

    /// Center longitude (degrees)
    pub longitude: f64,

    /// Radius (meters), must be > 0
    pub radius_m: f64,

    /// Lane narrower than the narrow-lane class
    #[serde(default)]
    pub narrow_lane: bool,

    /// Posted limit inside the zone (km/h)
    #[serde(default)]
    pub legal_speed_kmh: Option<f32>,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Tracing output
    Log,
    /// JSON-lines file output
    File,
}

impl RatingBlueprint {
    /// Total number of narrow-lane zones
    pub fn narrow_zone_count(&self) -> usize {
        self.road.zones.iter().filter(|zone| zone.narrow_lane).count()
    }
}
