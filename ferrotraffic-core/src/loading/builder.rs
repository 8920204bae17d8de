use geo::{Coord, Distance, Haversine, LineString, Point};
use geojson::{Feature, FeatureCollection, GeoJson};
use hashbrown::HashMap;
use log::{info, warn};
use petgraph::graph::{NodeIndex, UnGraph};

use super::config::NetworkConfig;
use crate::model::{EdgeFlags, SpeedEncoder, StreetEdge, StreetGraph, StreetNode};
use crate::{Error, Speed};

/// Loads the street network described by the configuration
///
/// # Errors
///
/// Returns an error if the file is missing, is not valid `GeoJSON` or
/// contains no usable streets
pub fn create_street_graph(config: &NetworkConfig) -> Result<StreetGraph, Error> {
    validate_config(config)?;

    info!(
        "Processing street data (GeoJSON): {}",
        config.path.display()
    );
    let raw = std::fs::read_to_string(&config.path)?;
    let graph = street_graph_from_geojson(&raw, config)?;

    info!(
        "Street network created: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Builds a street network from a `GeoJSON` `FeatureCollection`
///
/// Every `LineString` feature becomes one edge between its first and last
/// coordinate, lines sharing an end coordinate share a node. Other geometry
/// types are skipped.
///
/// # Errors
///
/// Returns an error if the document cannot be parsed, a speed cannot be
/// encoded, or no street remains
pub fn street_graph_from_geojson(raw: &str, config: &NetworkConfig) -> Result<StreetGraph, Error> {
    let encoder = SpeedEncoder::new(config.speed_bits, config.speed_factor)?;
    let collection = FeatureCollection::try_from(raw.parse::<GeoJson>()?)?;

    let mut graph = UnGraph::default();
    let mut nodes: HashMap<(u64, u64), NodeIndex> = HashMap::new();
    let mut skipped = 0usize;

    for feature in &collection.features {
        let Some(line) = feature_line(feature) else {
            skipped += 1;
            continue;
        };
        let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else {
            skipped += 1;
            continue;
        };

        let speed = feature_speed(feature).unwrap_or(config.default_speed);
        let flags = encoder.set_speed(EdgeFlags::default(), speed)?;

        let source = node_for(&mut graph, &mut nodes, first);
        let target = node_for(&mut graph, &mut nodes, last);
        let edge = StreetEdge {
            name: feature
                .property("name")
                .and_then(|name| name.as_str())
                .map(str::to_owned),
            length: line_length(&line),
            flags,
            geometry: line,
        };
        graph.add_edge(source, target, edge);
    }

    if skipped > 0 {
        warn!("Skipped {skipped} features without a usable LineString geometry");
    }
    if graph.edge_count() == 0 {
        return Err(Error::InvalidData(
            "Street network contains no LineString features".to_string(),
        ));
    }

    Ok(StreetGraph::new(graph, encoder, config.max_snap_distance))
}

fn validate_config(config: &NetworkConfig) -> Result<(), Error> {
    if !config.path.exists() {
        return Err(Error::InvalidData(format!(
            "Street network file not found: {}",
            config.path.display()
        )));
    }
    if config.default_speed.is_nan() || config.default_speed < 0.0 {
        return Err(Error::InvalidSpeed(config.default_speed));
    }
    Ok(())
}

fn feature_line(feature: &Feature) -> Option<LineString<f64>> {
    let geometry = feature.geometry.as_ref()?;
    let line = LineString::<f64>::try_from(&geometry.value).ok()?;
    (line.0.len() >= 2).then_some(line)
}

/// `maxspeed` is accepted both as number and as numeric string
fn feature_speed(feature: &Feature) -> Option<Speed> {
    match feature.property("maxspeed")? {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn node_for(
    graph: &mut UnGraph<StreetNode, StreetEdge>,
    nodes: &mut HashMap<(u64, u64), NodeIndex>,
    coord: Coord<f64>,
) -> NodeIndex {
    *nodes
        .entry((coord.x.to_bits(), coord.y.to_bits()))
        .or_insert_with(|| {
            graph.add_node(StreetNode {
                geometry: Point::from(coord),
            })
        })
}

fn line_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| Haversine.distance(Point::from(segment.start), Point::from(segment.end)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = include_str!("../../tests/fixtures/cologne_square.geojson");

    #[test]
    fn builds_square_network() {
        let graph = street_graph_from_geojson(SQUARE, &NetworkConfig::default()).unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);

        let south = graph.edge(petgraph::graph::EdgeIndex::new(0)).unwrap();
        assert_eq!(south.name.as_deref(), Some("Südstraße"));
        assert!((south.length - 701.0).abs() < 5.0);
    }

    #[test]
    fn reads_speed_properties() {
        let graph = street_graph_from_geojson(SQUARE, &NetworkConfig::default()).unwrap();
        let speeds: Vec<Speed> = (0..4)
            .map(|id| graph.edge_speed(petgraph::graph::EdgeIndex::new(id)).unwrap())
            .collect();

        assert_eq!(speeds, vec![50.0, 50.0, 30.0, 50.0]);
    }

    #[test]
    fn rejects_network_without_streets() {
        let raw = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            street_graph_from_geojson(raw, &NetworkConfig::default()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn rejects_missing_file() {
        let config = NetworkConfig {
            path: "/nonexistent/network.geojson".into(),
            ..NetworkConfig::default()
        };
        assert!(matches!(
            create_street_graph(&config),
            Err(Error::InvalidData(_))
        ));
    }
}
