use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::Time;
use crate::model::StreetGraph;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: Time,
    distance: f64,
    node: NodeIndex,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the heap pops the cheapest state first
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best known way to reach a node
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathCost {
    /// Seconds
    pub time: Time,
    /// Meters
    pub distance: f64,
}

/// Dijkstra's algorithm over edge travel times at the current speeds
/// Returns a map of node indices to the fastest travel time in seconds and
/// the length of that path. Edges with speed 0 are skipped.
pub fn dijkstra_path_weights(
    graph: &StreetGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
    max_cost: Option<Time>,
) -> HashMap<NodeIndex, PathCost> {
    let mut costs: HashMap<NodeIndex, PathCost> = HashMap::new();
    let mut heap = BinaryHeap::new();

    // Start node has cost 0
    heap.push(State {
        cost: 0,
        distance: 0.0,
        node: start,
    });
    costs.insert(
        start,
        PathCost {
            time: 0,
            distance: 0.0,
        },
    );

    while let Some(State {
        cost,
        distance,
        node,
    }) = heap.pop()
    {
        // Check if we've reached the target
        if target == Some(node) {
            break;
        }

        // Skip if we've found a better path
        if let Some(best) = costs.get(&node) {
            if cost > best.time {
                continue;
            }
        }

        // Check max cost constraint
        if max_cost.is_some_and(|max| cost > max) {
            continue;
        }

        for (next, edge) in graph.neighbors(node) {
            let Some(travel_time) = graph.travel_time(edge) else {
                continue;
            };
            let next_state = State {
                cost: cost + travel_time,
                distance: distance + edge.length,
                node: next,
            };
            let next_cost = PathCost {
                time: next_state.cost,
                distance: next_state.distance,
            };

            match costs.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(next_state);
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost.time < entry.get().time {
                        *entry.get_mut() = next_cost;
                        heap.push(next_state);
                    }
                }
            }
        }
    }

    costs
}
