use std::path::PathBuf;

use serde::Deserialize;

use crate::Speed;
use crate::model::streets::network::DEFAULT_MAX_SNAP_DISTANCE;

/// Street network source and encoding settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `GeoJSON` `FeatureCollection` of `LineString` streets
    pub path: PathBuf,
    /// Speed for streets without a `maxspeed` property, km/h
    pub default_speed: Speed,
    pub speed_bits: u32,
    /// Speed resolution, km/h
    pub speed_factor: f64,
    /// Meters
    pub max_snap_distance: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("network.geojson"),
            default_speed: 50.0,
            speed_bits: 5,
            speed_factor: 5.0,
            max_snap_distance: DEFAULT_MAX_SNAP_DISTANCE,
        }
    }
}
