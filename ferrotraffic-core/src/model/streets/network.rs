//! Street graph with spatial indices for snapping

use geo::{Distance, Haversine, Point};
use itertools::Itertools;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};

use super::components::{StreetEdge, StreetNode};
use super::encoder::SpeedEncoder;
use crate::{Error, Speed, Time};

/// Node position in the node R-tree
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;
/// Single straight piece of an edge geometry in the segment R-tree
pub type IndexedSegment = GeomWithData<Line<[f64; 2]>, EdgeIndex>;

/// Default radius in meters within which points are snapped to the network
pub const DEFAULT_MAX_SNAP_DISTANCE: f64 = 500.0;

/// Routable street network
///
/// Edges are undirected, each one carries a single speed shared by both
/// directions of travel.
#[derive(Debug)]
pub struct StreetGraph {
    pub(crate) graph: UnGraph<StreetNode, StreetEdge>,
    encoder: SpeedEncoder,
    max_snap_distance: f64,
    node_tree: RTree<IndexedPoint>,
    segment_tree: RTree<IndexedSegment>,
}

impl StreetGraph {
    pub fn new(
        graph: UnGraph<StreetNode, StreetEdge>,
        encoder: SpeedEncoder,
        max_snap_distance: f64,
    ) -> Self {
        let node_tree = RTree::bulk_load(
            graph
                .node_indices()
                .map(|node| {
                    let geometry = graph[node].geometry;
                    IndexedPoint::new([geometry.x(), geometry.y()], node)
                })
                .collect(),
        );

        let edges: Vec<(EdgeIndex, &StreetEdge)> =
            graph.edge_indices().map(|edge| (edge, &graph[edge])).collect();
        let segments: Vec<IndexedSegment> = edges
            .par_iter()
            .flat_map_iter(|&(id, edge)| {
                edge.geometry.coords().tuple_windows().map(move |(a, b)| {
                    IndexedSegment::new(Line::new([a.x, a.y], [b.x, b.y]), id)
                })
            })
            .collect();
        let segment_tree = RTree::bulk_load(segments);

        Self {
            graph,
            encoder,
            max_snap_distance,
            node_tree,
            segment_tree,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn encoder(&self) -> &SpeedEncoder {
        &self.encoder
    }

    pub fn edge(&self, id: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(id)
    }

    pub fn node(&self, id: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(id)
    }

    /// Nearest node and its distance in meters, `None` when nothing lies
    /// within the snapping radius
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let nearest = self.node_tree.nearest_neighbor(&[point.x(), point.y()])?;
        let [x, y] = *nearest.geom();
        let distance = Haversine.distance(*point, Point::new(x, y));

        (distance <= self.max_snap_distance).then_some((nearest.data, distance))
    }

    /// Edge passing closest to `point` and the distance to it in meters, `None`
    /// when nothing lies within the snapping radius
    pub fn nearest_edge(&self, point: &Point<f64>) -> Option<(EdgeIndex, f64)> {
        let query = [point.x(), point.y()];
        let nearest = self.segment_tree.nearest_neighbor(&query)?;
        let [x, y] = nearest.geom().nearest_point(&query);
        let distance = Haversine.distance(*point, Point::new(x, y));

        (distance <= self.max_snap_distance).then_some((nearest.data, distance))
    }

    /// # Errors
    ///
    /// Returns `InvalidEdge` if the edge does not exist
    pub fn edge_speed(&self, id: EdgeIndex) -> Result<Speed, Error> {
        self.graph
            .edge_weight(id)
            .map(|edge| self.encoder.speed(edge.flags))
            .ok_or(Error::InvalidEdge(id.index()))
    }

    /// # Errors
    ///
    /// Returns `InvalidEdge` if the edge does not exist and `InvalidSpeed` if
    /// the speed cannot be encoded
    pub fn set_edge_speed(&mut self, id: EdgeIndex, speed: Speed) -> Result<(), Error> {
        let encoder = self.encoder;
        let edge = self
            .graph
            .edge_weight_mut(id)
            .ok_or(Error::InvalidEdge(id.index()))?;
        edge.flags = encoder.set_speed(edge.flags, speed)?;
        Ok(())
    }

    /// Seconds needed to traverse the edge, `None` if it is closed
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn travel_time(&self, edge: &StreetEdge) -> Option<Time> {
        let speed = self.encoder.speed(edge.flags);
        if speed <= 0.0 {
            return None;
        }
        Some((edge.length / (speed / 3.6)).ceil() as Time)
    }

    /// Adjacent nodes together with the connecting edge
    pub(crate) fn neighbors(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, &StreetEdge)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{NetworkConfig, street_graph_from_geojson};

    fn square() -> StreetGraph {
        street_graph_from_geojson(
            include_str!("../../../tests/fixtures/cologne_square.geojson"),
            &NetworkConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn snaps_to_nearest_edge() {
        let graph = square();

        let (edge, distance) = graph.nearest_edge(&Point::new(6.955, 50.9401)).unwrap();
        assert_eq!(edge.index(), 0);
        assert!(distance < 20.0);

        let (edge, _) = graph.nearest_edge(&Point::new(6.9599, 50.9475)).unwrap();
        assert_eq!(edge.index(), 1);
    }

    #[test]
    fn distant_points_are_not_snapped() {
        let graph = square();
        assert!(graph.nearest_edge(&Point::new(2.0, 48.0)).is_none());
        assert!(graph.nearest_node(&Point::new(2.0, 48.0)).is_none());
    }

    #[test]
    fn empty_network_has_no_edges() {
        let graph = StreetGraph::new(UnGraph::default(), SpeedEncoder::default(), 500.0);
        assert!(graph.nearest_edge(&Point::new(6.955, 50.94)).is_none());
        assert!(graph.nearest_node(&Point::new(6.955, 50.94)).is_none());
    }

    #[test]
    fn updates_edge_speed() {
        let mut graph = square();
        let edge = EdgeIndex::new(0);

        assert!((graph.edge_speed(edge).unwrap() - 50.0).abs() < f64::EPSILON);
        graph.set_edge_speed(edge, 20.0).unwrap();
        assert!((graph.edge_speed(edge).unwrap() - 20.0).abs() < f64::EPSILON);

        assert!(matches!(
            graph.edge_speed(EdgeIndex::new(99)),
            Err(Error::InvalidEdge(99))
        ));
    }

    #[test]
    fn closed_edges_have_no_travel_time() {
        let mut graph = square();
        let edge = EdgeIndex::new(0);
        assert!(graph.travel_time(graph.edge(edge).unwrap()).is_some());

        graph.set_edge_speed(edge, 0.0).unwrap();
        assert!(graph.travel_time(graph.edge(edge).unwrap()).is_none());
    }
}
