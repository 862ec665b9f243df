//! Timetable construction: route + departure time -> stop times.

use chrono::Duration;
use tracing::trace;

use super::dwell::DwellPolicy;
use crate::config::EngineConfig;
use crate::domain::{ClockTime, Connection, MINUTES_PER_DAY, StationId, Stop, StopType};
use crate::network::NetworkGraph;

const SECONDS_PER_DAY: i64 = MINUTES_PER_DAY as i64 * 60;

/// Reasons a timetable cannot be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimetableError {
    #[error("a timetable needs at least two stations")]
    PathTooShort,

    #[error("path has {stations} stations but {connections} connections")]
    PathMismatch { stations: usize, connections: usize },

    #[error("connection {index} does not join {from} to {to}")]
    Disconnected {
        index: usize,
        from: StationId,
        to: StationId,
    },

    #[error("max speed must be positive, got {0}")]
    InvalidSpeed(f64),

    #[error("overnight route: arrival at {station} falls after midnight")]
    Overnight { station: StationId },
}

/// Builds per-stop times for a route.
pub struct Scheduler<'a> {
    graph: &'a NetworkGraph,
    config: &'a EngineConfig,
}

impl<'a> Scheduler<'a> {
    pub fn new(graph: &'a NetworkGraph, config: &'a EngineConfig) -> Self {
        Self { graph, config }
    }

    /// Stop type for a station at a position in the path.
    ///
    /// Calls at stations without an active platform are technical stops.
    fn stop_type(&self, station: &StationId, index: usize, len: usize) -> StopType {
        if index == 0 {
            StopType::Origin
        } else if index + 1 == len {
            StopType::Destination
        } else if self
            .graph
            .station(station)
            .is_some_and(|s| s.active_track_count() > 0 && !s.has_active_platform())
        {
            StopType::Technical
        } else {
            StopType::Intermediate
        }
    }

    /// Run time over one connection, in whole seconds.
    fn segment_seconds(&self, connection: &Connection, max_speed_kmh: f64) -> i64 {
        let speed = max_speed_kmh
            .min(connection.speed_limit_kmh)
            .max(self.config.min_segment_speed_kmh);
        (connection.distance_km / speed * 3600.0).round() as i64
    }

    /// Build the stop list for a path departing at `departure`.
    ///
    /// Running time is accumulated in seconds and stop times are truncated
    /// to the minute, with every leg taking at least one minute. The first stop has arrival = departure = the requested
    /// time; every later non-final stop adds its dwell. Routes that would
    /// run past midnight are rejected.
    ///
    /// # Examples
    ///
    /// A 10 km segment limited to 50 km/h takes 12 minutes:
    ///
    /// ```
    /// use timetable_server::config::EngineConfig;
    /// use timetable_server::domain::{ClockTime, Connection, ConnectionId, Station, StationId};
    /// use timetable_server::network::NetworkGraph;
    /// use timetable_server::schedule::{DwellPolicy, Scheduler};
    ///
    /// let id = |s: &str| StationId::parse(s).unwrap();
    /// let c = Connection {
    ///     id: ConnectionId(1),
    ///     from: id("A"),
    ///     to: id("B"),
    ///     distance_km: 10.0,
    ///     speed_limit_kmh: 50.0,
    ///     bidirectional: true,
    ///     active: true,
    /// };
    /// let station = |s: &str| Station { id: id(s), name: s.into(), tracks: vec![] };
    /// let graph = NetworkGraph::build(1, vec![station("A"), station("B")], vec![c.clone()]);
    /// let config = EngineConfig::default();
    ///
    /// let stops = Scheduler::new(&graph, &config)
    ///     .build_timetable(
    ///         &[id("A"), id("B")],
    ///         &[c],
    ///         ClockTime::parse_hhmm("08:00").unwrap(),
    ///         100.0,
    ///         &DwellPolicy::default(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(stops[1].arrival.to_string(), "08:12");
    /// ```
    pub fn build_timetable(
        &self,
        path: &[StationId],
        connections: &[Connection],
        departure: ClockTime,
        max_speed_kmh: f64,
        dwell: &DwellPolicy,
    ) -> Result<Vec<Stop>, TimetableError> {
        if path.len() < 2 {
            return Err(TimetableError::PathTooShort);
        }
        if connections.len() + 1 != path.len() {
            return Err(TimetableError::PathMismatch {
                stations: path.len(),
                connections: connections.len(),
            });
        }
        if !(max_speed_kmh.is_finite() && max_speed_kmh > 0.0) {
            return Err(TimetableError::InvalidSpeed(max_speed_kmh));
        }

        let start_secs = departure.minute_of_day() as i64 * 60;
        let at = |secs: i64| ClockTime::wrapping_from_minutes(secs / 60);

        let mut stops = Vec::with_capacity(path.len());
        stops.push(Stop {
            station: path[0],
            sequence: 0,
            arrival: departure,
            departure,
            dwell_minutes: 0,
            stop_type: StopType::Origin,
        });

        let mut clock = start_secs;
        for (index, connection) in connections.iter().enumerate() {
            let (from, to) = (path[index], path[index + 1]);
            let joins = (connection.from == from && connection.to == to)
                || (connection.bidirectional && connection.from == to && connection.to == from);
            if !joins {
                return Err(TimetableError::Disconnected { index, from, to });
            }

            clock += self.segment_seconds(connection, max_speed_kmh);
            // Arrival must fall strictly after the previous departure
            let left_at = stops.last().map_or(start_secs, |s: &Stop| {
                s.departure.minute_of_day() as i64 * 60
            });
            clock = clock.max(left_at + 60);
            if clock >= SECONDS_PER_DAY {
                return Err(TimetableError::Overnight { station: to });
            }
            let arrival = at(clock);

            let sequence = index + 1;
            let stop_type = self.stop_type(&to, sequence, path.len());
            let dwell_minutes = match stop_type {
                StopType::Destination => 0,
                other => dwell.minutes_for(&to, other),
            };

            clock += dwell_minutes as i64 * 60;
            if clock >= SECONDS_PER_DAY {
                return Err(TimetableError::Overnight { station: to });
            }
            // Departure keeps the whole dwell even when arrival was truncated
            let departure = arrival + Duration::minutes(dwell_minutes as i64);

            trace!(station = %to, %arrival, %departure, ?stop_type, "scheduled stop");

            stops.push(Stop {
                station: to,
                sequence: sequence as u32,
                arrival,
                departure,
                dwell_minutes,
                stop_type,
            });
        }

        Ok(stops)
    }
}
