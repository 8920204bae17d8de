use std::time::Duration;

use serde::Deserialize;

use super::feed::{COLOGNE_TRAFFIC_URL, UsageSpeeds};
use super::resolver::AnchorStrategy;

/// Traffic feed and update loop settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Run the periodic update loop
    pub enabled: bool,
    pub feed_url: String,
    pub poll_interval_secs: u64,
    pub connect_timeout_secs: u64,
    /// Anchor used for every ingestion path of this deployment
    pub anchor: AnchorStrategy,
    pub usage_speeds: UsageSpeeds,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: COLOGNE_TRAFFIC_URL.to_string(),
            poll_interval_secs: 150,
            connect_timeout_secs: 5,
            anchor: AnchorStrategy::Midpoint,
            usage_speeds: UsageSpeeds::default(),
        }
    }
}

impl TrafficConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
