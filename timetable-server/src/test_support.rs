//! Fixtures shared by unit tests.
//!
//! The reference network is A - B - C with two 10 km segments limited to
//! 50 km/h, every station having three platform tracks.

use crate::config::EngineConfig;
use crate::domain::{
    ClockTime, Connection, ConnectionId, DccAddress, Locomotive, LocomotiveAssignment,
    LocomotiveId, Station, StationId, Stop, Track, TrackId, TrackKind, Train, TrainDraft, TrainId,
    TrainNumber,
};
use crate::network::{NetworkGraph, find_route};
use crate::schedule::{DwellPolicy, Scheduler};
use crate::store::MemoryStore;

pub fn id(s: &str) -> StationId {
    StationId::parse(s).unwrap()
}

pub fn t(s: &str) -> ClockTime {
    ClockTime::parse_hhmm(s).unwrap()
}

pub fn number(s: &str) -> TrainNumber {
    TrainNumber::parse(s).unwrap()
}

/// A station with `tracks` active platform tracks.
pub fn station(code: &str, tracks: u32) -> Station {
    Station {
        id: id(code),
        name: format!("Station {code}"),
        tracks: (1..=tracks)
            .map(|n| Track {
                id: TrackId(n),
                name: format!("{n}"),
                kind: TrackKind::Platform,
                active: true,
            })
            .collect(),
    }
}

/// An active, bidirectional connection.
pub fn connection(n: u32, from: &str, to: &str, distance_km: f64, speed_limit_kmh: f64) -> Connection {
    Connection {
        id: ConnectionId(n),
        from: id(from),
        to: id(to),
        distance_km,
        speed_limit_kmh,
        bidirectional: true,
        active: true,
    }
}

pub fn locomotive(n: u32, dcc: u16) -> Locomotive {
    Locomotive {
        id: LocomotiveId(n),
        name: format!("Loco {n}"),
        dcc_address: DccAddress(dcc),
        max_speed_kmh: 120.0,
        turnaround_minutes: 10,
    }
}

pub fn abc_stations() -> Vec<Station> {
    vec![station("A", 3), station("B", 3), station("C", 3)]
}

pub fn abc_connections() -> Vec<Connection> {
    vec![
        connection(1, "A", "B", 10.0, 50.0),
        connection(2, "B", "C", 10.0, 50.0),
    ]
}

pub fn abc_graph() -> NetworkGraph {
    NetworkGraph::build(1, abc_stations(), abc_connections())
}

/// A store holding the A-B-C network and locomotives 1 and 2.
pub fn abc_store() -> MemoryStore {
    let store = MemoryStore::new();
    for s in abc_stations() {
        store.add_station(s);
    }
    for c in abc_connections() {
        store.add_connection(c);
    }
    store.add_locomotive(locomotive(1, 3));
    store.add_locomotive(locomotive(2, 5));
    store
}

/// Stops for a run between two stations of the A-B-C network.
pub fn stops_between(from: &str, to: &str, departure: &str) -> Vec<Stop> {
    let graph = abc_graph();
    let config = EngineConfig::default();
    let route = find_route(&graph, &id(from), &id(to)).unwrap();
    Scheduler::new(&graph, &config)
        .build_timetable(
            &route.path,
            &route.connections,
            t(departure),
            100.0,
            &DwellPolicy::default(),
        )
        .unwrap()
}

pub fn draft(number_str: &str, stops: Vec<Stop>, loco: u32) -> TrainDraft {
    TrainDraft {
        number: number(number_str),
        train_type: "regional".into(),
        max_speed_kmh: 100.0,
        stops,
        locomotives: vec![LocomotiveAssignment::lead(LocomotiveId(loco))],
    }
}

/// A draft running A -> C at `departure`.
pub fn draft_abc(number_str: &str, departure: &str, loco: u32) -> TrainDraft {
    draft(number_str, stops_between("A", "C", departure), loco)
}

/// A persisted train built directly, bypassing any store.
pub fn train(train_id: u64, number_str: &str, stops: Vec<Stop>, loco: u32) -> Train {
    Train::from_draft(TrainId(train_id), draft(number_str, stops, loco)).unwrap()
}
