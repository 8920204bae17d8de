use thiserror::Error;

use crate::Speed;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch traffic feed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid report entry: {0}")]
    InvalidEntry(String),
    #[error("Unsupported update policy: mode '{mode}' with value type '{value_type}'")]
    UnsupportedPolicy { mode: String, value_type: String },
    #[error("Speed {0} cannot be encoded")]
    InvalidSpeed(Speed),
    #[error("Invalid edge index {0}")]
    InvalidEdge(usize),
    #[error("No nearby points found for snapping")]
    NoPointsFound,
    #[error("No route between the requested points")]
    Unreachable,
    #[error("Street network lock poisoned")]
    LockPoisoned,
    #[error("Background task failed: {0}")]
    TaskFailed(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
