//! Live traffic ingestion for a routable street network.
//!
//! Traffic reports are fetched from an external feed, resolved to the nearest
//! street edge and applied as speed overrides while routing queries keep
//! reading the same network through a shared [`StateGate`].

pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod traffic;

pub use error::Error;
pub use loading::{NetworkConfig, create_street_graph, street_graph_from_geojson};
pub use model::{EdgeFlags, Point, ReportBatch, ReportEntry, SpeedEncoder, StreetGraph};
pub use traffic::{
    AnchorStrategy, ApplyStats, BatchApplier, EdgeResolver, FeedSource, HttpFeedSource,
    RoadNetwork, StateGate, TrafficConfig, TrafficUpdater,
};

/// Street graph edge identifier
pub type EdgeId = petgraph::graph::EdgeIndex;
/// Street graph node identifier
pub type StreetNodeId = petgraph::graph::NodeIndex;
/// Travel time in seconds
pub type Time = u32;
/// Speed in km/h
pub type Speed = f64;
