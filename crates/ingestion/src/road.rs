//! Geofence road context provider

use contracts::{ContractError, RoadConfig, RoadContext, RoadContextProvider, RoadZone};
use tracing::trace;

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const KMH_PER_MPS: f32 = 3.6;

/// Great-circle distance between two coordinates (meters)
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().clamp(0.0, 1.0).asin()
}

/// Answers lookups from configured circular zones
///
/// Zones are checked in configuration order and the first one containing the
/// point wins. Outside every zone the unknown-road context is returned.
#[derive(Debug, Clone, Default)]
pub struct ZoneRoadProvider {
    zones: Vec<RoadZone>,
}

impl ZoneRoadProvider {
    pub fn new(zones: Vec<RoadZone>) -> Self {
        Self { zones }
    }

    pub fn from_config(config: &RoadConfig) -> Self {
        Self::new(config.zones.clone())
    }

    pub fn zones(&self) -> &[RoadZone] {
        &self.zones
    }

    /// Zone containing the point, if any
    pub fn zone_at(&self, latitude: f64, longitude: f64) -> Option<&RoadZone> {
        self.zones
            .iter()
            .find(|zone| haversine_m(zone.latitude, zone.longitude, latitude, longitude) <= zone.radius_m)
    }
}

impl RoadContextProvider for ZoneRoadProvider {
    fn lookup(&self, latitude: f64, longitude: f64) -> Result<RoadContext, ContractError> {
        if !(latitude.is_finite() && longitude.is_finite()) {
            return Err(ContractError::road_lookup(
                latitude,
                longitude,
                "coordinates are not finite",
            ));
        }

        let Some(zone) = self.zone_at(latitude, longitude) else {
            return Ok(RoadContext::default());
        };

        trace!(zone = %zone.name, latitude, longitude, "position inside zone");
        Ok(RoadContext {
            is_narrow_lane: zone.narrow_lane,
            legal_speed_mps: zone.legal_speed_kmh.map(|kmh| kmh / KMH_PER_MPS),
            expected_heading_deg: None,
        })
    }
}
