//! Shortest-path routing over the network graph.
//!
//! Dijkstra on track length. The open set is ordered by distance and then
//! by station id, so equal-distance alternatives resolve the same way on
//! every call. Relaxation only replaces a distance that is strictly
//! shorter, which keeps the first-discovered predecessor on ties.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use serde::Serialize;
use tracing::{debug, trace};

use super::graph::NetworkGraph;
use crate::domain::{Connection, StationId};

/// A route through the network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// Stations in travel order, endpoints included.
    pub path: Vec<StationId>,

    /// Connections between consecutive path stations, oriented in travel
    /// direction. Always one shorter than `path`.
    pub connections: Vec<Connection>,

    pub total_distance_km: f64,
}

impl RouteResult {
    pub fn origin(&self) -> Option<StationId> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<StationId> {
        self.path.last().copied()
    }

    /// Build a route by following graph edges along `path`.
    ///
    /// Returns `None` if any consecutive pair is not connected.
    pub fn along(graph: &NetworkGraph, path: &[StationId]) -> Option<RouteResult> {
        let mut connections = Vec::with_capacity(path.len().saturating_sub(1));
        let mut total = 0.0;
        for pair in path.windows(2) {
            let edge = graph.edge(&pair[0], &pair[1])?;
            total += edge.distance_km();
            connections.push(edge.connection.clone());
        }
        Some(RouteResult {
            path: path.to_vec(),
            connections,
            total_distance_km: total,
        })
    }
}

/// Open-set entry. Ordered so that `BinaryHeap` pops the smallest
/// distance first, then the smallest station id.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    distance: f64,
    station: StationId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.station.cmp(&self.station))
    }
}

/// Find the shortest route between two stations.
///
/// Returns `None` when either endpoint is not in the graph or no path
/// connects them. `from == to` yields a single-station route of length 0.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::{Connection, ConnectionId, Station, StationId};
/// use timetable_server::network::{NetworkGraph, find_route};
///
/// let id = |s: &str| StationId::parse(s).unwrap();
/// let station = |s: &str| Station { id: id(s), name: s.into(), tracks: vec![] };
/// let graph = NetworkGraph::build(
///     1,
///     vec![station("A"), station("B")],
///     vec![Connection {
///         id: ConnectionId(1),
///         from: id("A"),
///         to: id("B"),
///         distance_km: 4.0,
///         speed_limit_kmh: 60.0,
///         bidirectional: true,
///         active: true,
///     }],
/// );
///
/// let route = find_route(&graph, &id("B"), &id("A")).unwrap();
/// assert_eq!(route.path, vec![id("B"), id("A")]);
/// assert_eq!(route.total_distance_km, 4.0);
/// ```
pub fn find_route(graph: &NetworkGraph, from: &StationId, to: &StationId) -> Option<RouteResult> {
    if !graph.contains(from) || !graph.contains(to) {
        debug!(from = %from, to = %to, "route endpoint not in graph");
        return None;
    }

    let mut best: BTreeMap<StationId, f64> = BTreeMap::new();
    let mut previous: BTreeMap<StationId, Connection> = BTreeMap::new();
    let mut open = BinaryHeap::new();

    best.insert(*from, 0.0);
    open.push(OpenEntry {
        distance: 0.0,
        station: *from,
    });

    while let Some(OpenEntry { distance, station }) = open.pop() {
        if station == *to {
            break;
        }
        // Stale entry: a shorter distance was found after this was pushed
        if best.get(&station).is_some_and(|&d| distance > d) {
            continue;
        }

        for edge in graph.neighbours(&station) {
            let next = edge.to();
            let candidate = distance + edge.distance_km();
            let improves = best.get(&next).is_none_or(|&d| candidate < d);
            if improves {
                trace!(from = %station, to = %next, distance = candidate, "relax");
                best.insert(next, candidate);
                previous.insert(next, edge.connection.clone());
                open.push(OpenEntry {
                    distance: candidate,
                    station: next,
                });
            }
        }
    }

    let total_distance_km = *best.get(to)?;

    let mut connections = Vec::new();
    let mut cursor = *to;
    while cursor != *from {
        let connection = previous.get(&cursor)?.clone();
        cursor = connection.from;
        connections.push(connection);
    }
    connections.reverse();

    let mut path = Vec::with_capacity(connections.len() + 1);
    path.push(*from);
    path.extend(connections.iter().map(|c| c.to));

    debug!(from = %from, to = %to, stops = path.len(), distance_km = total_distance_km, "found route");

    Some(RouteResult {
        path,
        connections,
        total_distance_km,
    })
}
