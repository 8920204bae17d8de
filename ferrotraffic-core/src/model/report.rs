//! Traffic reports as received from feeds and manual pushes.
//!
//! On the wire a report batch is a JSON array of entries:
//!
//! ```json
//! [{"id": "ST028_0", "points": [[6.95, 50.94]], "value": 20.0, "value_type": "speed", "mode": "replace"}]
//! ```
//!
//! Points are encoded as `[lon, lat]` pairs, the same order `GeoJSON` uses.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeTuple};

use crate::Error;

/// Geographic coordinate in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(point: Point) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl From<geo::Point<f64>> for Point {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.lon)?;
        pair.serialize_element(&self.lat)?;
        pair.end()
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Positions may carry an altitude as third element, it is ignored
        let position = Vec::<f64>::deserialize(deserializer)?;
        match position.as_slice() {
            [lon, lat, ..] => Ok(Point::new(*lat, *lon)),
            _ => Err(serde::de::Error::invalid_length(
                position.len(),
                &"a [lon, lat] pair",
            )),
        }
    }
}

/// Kind of value carried by a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Speed,
    Other(String),
}

impl From<String> for ValueType {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("speed") {
            ValueType::Speed
        } else {
            ValueType::Other(value)
        }
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Speed => f.write_str("speed"),
            ValueType::Other(other) => f.write_str(other),
        }
    }
}

/// How a report value is combined with the current edge state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateMode {
    Replace,
    Other(String),
}

impl From<String> for UpdateMode {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("replace") {
            UpdateMode::Replace
        } else {
            UpdateMode::Other(value)
        }
    }
}

impl From<UpdateMode> for String {
    fn from(value: UpdateMode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Replace => f.write_str("replace"),
            UpdateMode::Other(other) => f.write_str(other),
        }
    }
}

/// Single traffic observation along a polyline
///
/// `points` is never empty, both the constructor and deserialization reject
/// entries without geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReportEntry")]
pub struct ReportEntry {
    id: String,
    points: Vec<Point>,
    value: f64,
    value_type: ValueType,
    mode: UpdateMode,
}

#[derive(Deserialize)]
struct RawReportEntry {
    id: String,
    points: Vec<Point>,
    value: f64,
    value_type: ValueType,
    mode: UpdateMode,
}

impl TryFrom<RawReportEntry> for ReportEntry {
    type Error = Error;

    fn try_from(raw: RawReportEntry) -> Result<Self, Self::Error> {
        ReportEntry::new(raw.id, raw.points, raw.value, raw.value_type, raw.mode)
    }
}

impl ReportEntry {
    /// # Errors
    ///
    /// Returns `InvalidEntry` if `points` is empty
    pub fn new(
        id: impl Into<String>,
        points: Vec<Point>,
        value: f64,
        value_type: ValueType,
        mode: UpdateMode,
    ) -> Result<Self, Error> {
        let id = id.into();
        if points.is_empty() {
            return Err(Error::InvalidEntry(format!("entry '{id}' has no points")));
        }

        Ok(Self {
            id,
            points,
            value,
            value_type,
            mode,
        })
    }

    /// Speed override replacing the current edge speed
    pub fn speed(id: impl Into<String>, points: Vec<Point>, speed: f64) -> Result<Self, Error> {
        Self::new(id, points, speed, ValueType::Speed, UpdateMode::Replace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn mode(&self) -> &UpdateMode {
        &self.mode
    }
}

/// Ordered set of reports from one fetch cycle or push request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportBatch(Vec<ReportEntry>);

impl ReportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportEntry> {
        self.0.iter()
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.0
    }
}

impl From<Vec<ReportEntry>> for ReportBatch {
    fn from(entries: Vec<ReportEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<ReportEntry> for ReportBatch {
    fn from_iter<I: IntoIterator<Item = ReportEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ReportBatch {
    type Item = ReportEntry;
    type IntoIter = std::vec::IntoIter<ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReportBatch {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
