//! This module is responsible for loading the street network the traffic
//! reports are applied to.

mod builder;
mod config;

pub use builder::{create_street_graph, street_graph_from_geojson};
pub use config::NetworkConfig;
