//! Street network components - nodes and edges

use geo::{LineString, Point};

use super::encoder::EdgeFlags;

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Street name, if the source data has one
    pub name: Option<String>,
    /// Length in meters
    pub length: f64,
    /// Packed edge state, see [`super::SpeedEncoder`]
    pub flags: EdgeFlags,
    pub geometry: LineString<f64>,
}
