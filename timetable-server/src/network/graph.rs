//! In-memory view of the station network.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{Connection, SegmentKey, Station, StationId};

/// A directed edge of the network graph.
///
/// The connection is oriented so that `connection.from` is the station the
/// edge leaves and `connection.to` the one it reaches.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub connection: Connection,
}

impl Edge {
    pub fn to(&self) -> StationId {
        self.connection.to
    }

    pub fn distance_km(&self) -> f64 {
        self.connection.distance_km
    }
}

/// Stations and active connections at one network revision.
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    revision: u64,
    stations: BTreeMap<StationId, Station>,
    adjacency: BTreeMap<StationId, Vec<Edge>>,
}

impl NetworkGraph {
    /// Build the graph from reference data.
    ///
    /// Inactive connections are ignored. Connections with a negative
    /// distance, a non-positive speed limit, or an endpoint that is not a
    /// known station are skipped with a warning. Bidirectional connections
    /// add an edge in each direction.
    pub fn build(revision: u64, stations: Vec<Station>, connections: Vec<Connection>) -> Self {
        let stations: BTreeMap<StationId, Station> =
            stations.into_iter().map(|s| (s.id, s)).collect();
        let mut adjacency: BTreeMap<StationId, Vec<Edge>> = BTreeMap::new();
        let mut edge_count = 0usize;

        for connection in connections {
            if !connection.active {
                continue;
            }
            if !connection.is_well_formed() {
                warn!(
                    connection = connection.id.0,
                    distance_km = connection.distance_km,
                    speed_limit_kmh = connection.speed_limit_kmh,
                    "skipping malformed connection"
                );
                continue;
            }
            if !stations.contains_key(&connection.from) || !stations.contains_key(&connection.to)
            {
                warn!(
                    connection = connection.id.0,
                    from = %connection.from,
                    to = %connection.to,
                    "skipping connection to unknown station"
                );
                continue;
            }

            if connection.bidirectional {
                let reversed = connection.reversed();
                adjacency.entry(reversed.from).or_default().push(Edge {
                    connection: reversed,
                });
                edge_count += 1;
            }
            adjacency.entry(connection.from).or_default().push(Edge { connection });
            edge_count += 1;
        }

        debug!(
            revision,
            stations = stations.len(),
            edges = edge_count,
            "built network graph"
        );

        Self {
            revision,
            stations,
            adjacency,
        }
    }

    /// Network revision this graph was built from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.stations.contains_key(id)
    }

    /// Station ids in ascending order.
    pub fn station_ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.keys().copied()
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Edges leaving a station, in connection order.
    pub fn neighbours(&self, id: &StationId) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The directed edge from `from` to `to`, if one exists.
    pub fn edge(&self, from: &StationId, to: &StationId) -> Option<&Edge> {
        self.neighbours(from).iter().find(|e| &e.to() == to)
    }

    /// Returns true if the two stations share an active connection.
    pub fn has_segment(&self, segment: &SegmentKey) -> bool {
        self.edge(&segment.a, &segment.b).is_some() || self.edge(&segment.b, &segment.a).is_some()
    }
}
