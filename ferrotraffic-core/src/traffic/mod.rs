//! Live traffic ingestion: feed parsing, edge resolution, batch application
//! and the background update loop.

pub mod applier;
pub mod config;
pub mod feed;
pub mod gate;
pub mod network;
pub mod resolver;
pub mod updater;

pub use applier::{ApplyStats, BatchApplier, EntryRejection, RejectedEntry};
pub use config::TrafficConfig;
pub use feed::{
    COLOGNE_TRAFFIC_URL, FeedSource, HttpFeedSource, SpeedPolicy, UsageCode, UsageSpeeds,
    parse_feed,
};
pub use gate::StateGate;
pub use network::RoadNetwork;
pub use resolver::{AnchorStrategy, EdgeResolver};
pub use updater::{TrafficUpdater, UpdateSummary};
