//! Contract between the traffic pipeline and the street storage

use crate::model::{Point, StreetGraph};
use crate::{EdgeId, Error, Speed};

/// Street storage the traffic pipeline reads from and writes to
pub trait RoadNetwork {
    /// Edge nearest to `point`, `None` if no edge is close enough
    fn nearest_edge(&self, point: &Point) -> Option<EdgeId>;

    /// Current speed of the edge
    fn speed(&self, edge: EdgeId) -> Result<Speed, Error>;

    fn set_speed(&mut self, edge: EdgeId, speed: Speed) -> Result<(), Error>;

    /// Speed as the storage would read it back after `set_speed`
    fn quantize_speed(&self, speed: Speed) -> Result<Speed, Error> {
        if speed.is_nan() || speed < 0.0 {
            return Err(Error::InvalidSpeed(speed));
        }
        Ok(speed)
    }
}

impl RoadNetwork for StreetGraph {
    fn nearest_edge(&self, point: &Point) -> Option<EdgeId> {
        StreetGraph::nearest_edge(self, &(*point).into()).map(|(edge, _)| edge)
    }

    fn speed(&self, edge: EdgeId) -> Result<Speed, Error> {
        self.edge_speed(edge)
    }

    fn set_speed(&mut self, edge: EdgeId, speed: Speed) -> Result<(), Error> {
        self.set_edge_speed(edge, speed)
    }

    fn quantize_speed(&self, speed: Speed) -> Result<Speed, Error> {
        self.encoder().quantize(speed)
    }
}
