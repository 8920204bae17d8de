//! Resolution of report geometries to street edges

use serde::{Deserialize, Serialize};

use super::network::RoadNetwork;
use crate::EdgeId;
use crate::model::{Point, ReportEntry};

/// Which point of a report polyline is snapped to the network
///
/// A deployment picks one strategy for every ingestion path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// Point at index `len / 2`
    #[default]
    Midpoint,
    /// Point at index 0
    FirstPoint,
}

impl AnchorStrategy {
    pub fn anchor<'a>(&self, entry: &'a ReportEntry) -> &'a Point {
        let points = entry.points();
        match self {
            AnchorStrategy::Midpoint => &points[points.len() / 2],
            AnchorStrategy::FirstPoint => &points[0],
        }
    }
}

/// Maps report geometries to the nearest edge of the network
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeResolver {
    strategy: AnchorStrategy,
}

impl EdgeResolver {
    pub fn new(strategy: AnchorStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> AnchorStrategy {
        self.strategy
    }

    /// Nearest edge to `point` over all edges, `None` if nothing matches
    pub fn resolve<N: RoadNetwork + ?Sized>(&self, network: &N, point: &Point) -> Option<EdgeId> {
        network.nearest_edge(point)
    }

    /// Resolves the anchor point of `entry`, returned alongside the edge
    pub fn resolve_entry<'a, N: RoadNetwork + ?Sized>(
        &self,
        network: &N,
        entry: &'a ReportEntry,
    ) -> (&'a Point, Option<EdgeId>) {
        let point = self.strategy.anchor(entry);
        (point, self.resolve(network, point))
    }
}
