// Re-export key components
pub use crate::loading::{NetworkConfig, create_street_graph, street_graph_from_geojson};
pub use crate::model::{Point, ReportBatch, ReportEntry, StreetGraph, UpdateMode, ValueType};
pub use crate::routing::{RouteSummary, fastest_route};
pub use crate::traffic::{
    AnchorStrategy, ApplyStats, BatchApplier, EdgeResolver, EntryRejection, FeedSource,
    HttpFeedSource, RoadNetwork, SpeedPolicy, StateGate, TrafficConfig, TrafficUpdater,
    UpdateSummary, UsageCode, UsageSpeeds, parse_feed,
};

// Core types for the street network
pub use crate::EdgeId;
pub use crate::Speed; // km/h
pub use crate::StreetNodeId;
pub use crate::Time; // seconds
pub use crate::error::Error;
