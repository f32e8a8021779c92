//! RoadContext - per-location road metadata
//!
//! The engine only consumes this narrow interface; map lookups live with the
//! embedding application.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Road metadata for a single position
///
/// `Default` is the "unknown road" context: not narrow, default highway limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadContext {
    /// Lane narrower than the narrow-lane class
    #[serde(default)]
    pub is_narrow_lane: bool,

    /// Legal speed (m/s); `None` means the default highway limit applies
    #[serde(default)]
    pub legal_speed_mps: Option<f32>,

    /// Expected driving direction of the road (degrees)
    #[serde(default)]
    pub expected_heading_deg: Option<f32>,
}

impl RoadContext {
    /// Narrow-lane context with no explicit speed limit
    pub fn narrow() -> Self {
        Self {
            is_narrow_lane: true,
            ..Default::default()
        }
    }

    /// Context with an explicit legal speed
    pub fn with_legal_speed_mps(mut self, speed_mps: f32) -> Self {
        self.legal_speed_mps = Some(speed_mps);
        self
    }
}

/// Road context provider trait
///
/// Answers "what road am I on" for a position. Implementations may be backed
/// by a geofence table, a cached map service, or nothing at all. A failed
/// lookup is never fatal to the engine: it degrades to `RoadContext::default()`.
pub trait RoadContextProvider: Send + Sync {
    /// Look up the road context at the given coordinates
    fn lookup(&self, latitude: f64, longitude: f64) -> Result<RoadContext, ContractError>;
}

/// Provider with no road knowledge
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownRoad;

impl RoadContextProvider for UnknownRoad {
    fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<RoadContext, ContractError> {
        Ok(RoadContext::default())
    }
}

impl<P: RoadContextProvider + ?Sized> RoadContextProvider for std::sync::Arc<P> {
    fn lookup(&self, latitude: f64, longitude: f64) -> Result<RoadContext, ContractError> {
        (**self).lookup(latitude, longitude)
    }
}
