//! Traffic feed retrieval and parsing
//!
//! The feed is the Cologne open data traffic service: an Esri JSON layer where
//! each feature carries a street section identifier, a usage code and one or
//! more polylines of `[lon, lat]` positions.

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::model::{Point, ReportBatch, ReportEntry};
use crate::{Error, Speed};

pub const COLOGNE_TRAFFIC_URL: &str =
    "http://www.stadt-koeln.de/externe-dienste/open-data/traffic.php";

/// Congestion level reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCode {
    FreeFlow,
    Slow,
    Jam,
}

impl UsageCode {
    /// The feed documents only the codes 0, 1 and 2
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(UsageCode::FreeFlow),
            1 => Some(UsageCode::Slow),
            2 => Some(UsageCode::Jam),
            _ => None,
        }
    }
}

/// Maps a usage code to the speed override applied to the street
///
/// Returning `None` drops the feature.
pub trait SpeedPolicy: Send + Sync {
    fn speed_for(&self, usage: UsageCode) -> Option<Speed>;
}

/// Fixed speed per usage code, km/h
///
/// Free flow does not restore the speed a street had before a jam, it sets
/// `free_flow` like any other code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSpeeds {
    pub free_flow: Speed,
    pub slow: Speed,
    pub jam: Speed,
}

impl Default for UsageSpeeds {
    fn default() -> Self {
        Self {
            free_flow: 45.0,
            slow: 20.0,
            jam: 5.0,
        }
    }
}

impl SpeedPolicy for UsageSpeeds {
    fn speed_for(&self, usage: UsageCode) -> Option<Speed> {
        Some(match usage {
            UsageCode::FreeFlow => self.free_flow,
            UsageCode::Slow => self.slow,
            UsageCode::Jam => self.jam,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenTrafficData {
    features: Vec<TrafficFeature>,
}

#[derive(Debug, Deserialize)]
struct TrafficFeature {
    attributes: TrafficAttributes,
    geometry: Option<TrafficGeometry>,
}

#[derive(Debug, Deserialize)]
struct TrafficAttributes {
    #[serde(rename = "IDENTIFIER")]
    identifier: String,
    #[serde(rename = "AUSLASTUNG")]
    usage: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TrafficGeometry {
    #[serde(default)]
    paths: Vec<Vec<Point>>,
}

/// Parses a feed payload into one report per polyline
///
/// Entry ids are `{IDENTIFIER}_{polyline index}`. Features with an unknown
/// usage code and empty polylines are skipped.
///
/// # Errors
///
/// Returns `Parse` if the payload does not match the feed layout
pub fn parse_feed<P: SpeedPolicy + ?Sized>(payload: &str, policy: &P) -> Result<ReportBatch, Error> {
    let data: OpenTrafficData = serde_json::from_str(payload)?;
    let mut batch = ReportBatch::new();

    for feature in data.features {
        let TrafficAttributes { identifier, usage } = feature.attributes;
        let Some(speed) = usage
            .and_then(UsageCode::from_code)
            .and_then(|usage| policy.speed_for(usage))
        else {
            debug!("Skipping feature {identifier} with usage code {usage:?}");
            continue;
        };

        let paths = feature.geometry.map(|geometry| geometry.paths).unwrap_or_default();
        for (path_index, points) in paths.into_iter().enumerate() {
            if points.is_empty() {
                continue;
            }
            batch.push(ReportEntry::speed(
                format!("{identifier}_{path_index}"),
                points,
                speed,
            )?);
        }
    }

    Ok(batch)
}

/// Source of report batches for the update loop
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<ReportBatch, Error>> + Send;
}

/// Feed fetched over HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFeedSource<P = UsageSpeeds> {
    client: reqwest::Client,
    url: String,
    policy: P,
}

impl<P: SpeedPolicy> HttpFeedSource<P> {
    /// Only connecting is bounded by `connect_timeout`, a stalled response
    /// body is waited for.
    ///
    /// # Errors
    ///
    /// Returns `Fetch` if the HTTP client cannot be created
    pub fn new(url: impl Into<String>, connect_timeout: Duration, policy: P) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            policy,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_payload(&self) -> Result<String, Error> {
        let payload = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(payload)
    }
}

impl<P: SpeedPolicy + 'static> FeedSource for HttpFeedSource<P> {
    async fn fetch(&self) -> Result<ReportBatch, Error> {
        info!("Fetching traffic data from {}", self.url);
        let payload = self.fetch_payload().await?;
        parse_feed(&payload, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = include_str!("../../tests/fixtures/cologne_traffic.json");

    #[test]
    fn parses_feed_in_fetch_order() {
        let batch = parse_feed(FEED, &UsageSpeeds::default()).unwrap();
        assert_eq!(batch.len(), 3);

        let ids: Vec<&str> = batch.iter().map(ReportEntry::id).collect();
        assert_eq!(ids, vec!["ST001_0", "ST028_0", "ST065_0"]);

        let values: Vec<Speed> = batch.iter().map(ReportEntry::value).collect();
        assert_eq!(values, vec![45.0, 20.0, 5.0]);
    }

    #[test]
    fn swaps_coordinate_order() {
        let batch = parse_feed(FEED, &UsageSpeeds::default()).unwrap();
        let first = batch.entries()[0].points()[0];
        assert!((first.lat - 50.9401).abs() < 1e-9);
        assert!((first.lon - 6.950).abs() < 1e-9);
    }

    #[test]
    fn splits_polylines_into_entries() {
        let payload = r#"{"features": [{
            "attributes": {"IDENTIFIER": "ST100", "AUSLASTUNG": 2},
            "geometry": {"paths": [[[6.9, 50.9]], [], [[6.8, 50.8], [6.81, 50.81]]]}
        }]}"#;
        let batch = parse_feed(payload, &UsageSpeeds::default()).unwrap();

        let ids: Vec<&str> = batch.iter().map(ReportEntry::id).collect();
        assert_eq!(ids, vec!["ST100_0", "ST100_2"]);
    }

    #[test]
    fn maps_usage_codes() {
        let speeds = UsageSpeeds::default();
        let speed = |code| UsageCode::from_code(code).and_then(|usage| speeds.speed_for(usage));

        assert_eq!(speed(0), Some(45.0));
        assert_eq!(speed(1), Some(20.0));
        assert_eq!(speed(2), Some(5.0));
        assert_eq!(speed(3), None);
        assert_eq!(speed(-1), None);
    }

    #[test]
    fn skips_features_without_usage() {
        let payload = r#"{"features": [
            {"attributes": {"IDENTIFIER": "A", "AUSLASTUNG": null}, "geometry": {"paths": [[[6.9, 50.9]]]}},
            {"attributes": {"IDENTIFIER": "B", "AUSLASTUNG": 1}},
            {"attributes": {"IDENTIFIER": "C", "AUSLASTUNG": 1}, "geometry": {"paths": [[[6.9, 50.9]]]}}
        ]}"#;
        let batch = parse_feed(payload, &UsageSpeeds::default()).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries()[0].id(), "C_0");
    }

    #[test]
    fn custom_policy_can_drop_codes() {
        struct JamsOnly;
        impl SpeedPolicy for JamsOnly {
            fn speed_for(&self, usage: UsageCode) -> Option<Speed> {
                (usage == UsageCode::Jam).then_some(10.0)
            }
        }

        let batch = parse_feed(FEED, &JamsOnly).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries()[0].id(), "ST065_0");
        assert!((batch.entries()[0].value() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        assert!(matches!(
            parse_feed("<html>maintenance</html>", &UsageSpeeds::default()),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            parse_feed(r#"{"features": [{"attributes": {}}]}"#, &UsageSpeeds::default()),
            Err(Error::Parse(_))
        ));
    }
}
