//! Travel time queries over the current edge speeds

pub mod dijkstra;

use serde::Serialize;

use crate::model::{Point, StreetGraph};
use crate::{Error, Time};

/// Fastest connection between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    /// Seconds
    pub travel_time: Time,
    /// Meters along the streets
    pub distance: f64,
}

/// Snaps both points to the nearest nodes and finds the fastest path between them
///
/// # Errors
///
/// Returns `NoPointsFound` if a point cannot be snapped and `Unreachable` if
/// no open streets connect the two nodes
pub fn fastest_route(graph: &StreetGraph, from: &Point, to: &Point) -> Result<RouteSummary, Error> {
    let (source, _) = graph
        .nearest_node(&(*from).into())
        .ok_or(Error::NoPointsFound)?;
    let (target, _) = graph
        .nearest_node(&(*to).into())
        .ok_or(Error::NoPointsFound)?;

    let costs = dijkstra::dijkstra_path_weights(graph, source, Some(target), None);
    costs
        .get(&target)
        .map(|cost| RouteSummary {
            travel_time: cost.time,
            distance: cost.distance,
        })
        .ok_or(Error::Unreachable)
}
