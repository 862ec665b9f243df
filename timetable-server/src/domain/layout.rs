//! Layout reference data: stations, tracks and connections.
//!
//! These records are owned by the external layout managers. The timetable
//! engine reads them and never mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StationId;

/// Identifier of a track within the layout database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

/// Identifier of a connection within the layout database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

/// What a station track is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Platform,
    Through,
    Siding,
    #[serde(other)]
    Other,
}

/// A track at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub name: String,
    pub kind: TrackKind,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A station and its tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Station {
    /// Number of tracks currently in service.
    pub fn active_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.active).count()
    }

    /// A station with no active track cannot host any stop.
    pub fn can_host_stops(&self) -> bool {
        self.active_track_count() > 0
    }

    /// Returns true if at least one active platform track exists.
    pub fn has_active_platform(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| t.active && t.kind == TrackKind::Platform)
    }
}

/// A graph edge between two stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: StationId,
    pub to: StationId,
    pub distance_km: f64,
    pub speed_limit_kmh: f64,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Connection {
    /// Distance must be non-negative and finite, speed limit positive.
    pub fn is_well_formed(&self) -> bool {
        self.distance_km.is_finite()
            && self.distance_km >= 0.0
            && self.speed_limit_kmh.is_finite()
            && self.speed_limit_kmh > 0.0
    }

    /// The track segment this connection covers, ignoring direction.
    pub fn segment(&self) -> SegmentKey {
        SegmentKey::new(self.from, self.to)
    }

    /// The same connection traversed the other way round.
    pub fn reversed(&self) -> Connection {
        Connection {
            from: self.to,
            to: self.from,
            ..self.clone()
        }
    }
}

/// A track segment between two stations, independent of travel direction.
///
/// `SegmentKey::new(a, b) == SegmentKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub a: StationId,
    pub b: StationId,
}

impl SegmentKey {
    pub fn new(x: StationId, y: StationId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}↔{}", self.a, self.b)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn track(n: u32, kind: TrackKind, active: bool) -> Track {
        Track {
            id: TrackId(n),
            name: format!("{n}"),
            kind,
            active,
        }
    }

    #[test]
    fn active_track_counting() {
        let station = Station {
            id: id("HBF"),
            name: "Hauptbahnhof".into(),
            tracks: vec![
                track(1, TrackKind::Platform, true),
                track(2, TrackKind::Platform, false),
                track(3, TrackKind::Siding, true),
            ],
        };
        assert_eq!(station.active_track_count(), 2);
        assert!(station.can_host_stops());
        assert!(station.has_active_platform());
    }

    #[test]
    fn station_without_active_tracks() {
        let station = Station {
            id: id("DEPOT"),
            name: "Depot".into(),
            tracks: vec![track(1, TrackKind::Siding, false)],
        };
        assert!(!station.can_host_stops());
        assert!(!station.has_active_platform());
    }

    #[test]
    fn segment_key_is_direction_independent() {
        assert_eq!(SegmentKey::new(id("A"), id("B")), SegmentKey::new(id("B"), id("A")));
        assert_eq!(SegmentKey::new(id("B"), id("A")).to_string(), "A↔B");
    }

    #[test]
    fn connection_well_formedness() {
        let mut c = Connection {
            id: ConnectionId(1),
            from: id("A"),
            to: id("B"),
            distance_km: 10.0,
            speed_limit_kmh: 50.0,
            bidirectional: true,
            active: true,
        };
        assert!(c.is_well_formed());
        assert_eq!(c.reversed().from, id("B"));
        c.speed_limit_kmh = 0.0;
        assert!(!c.is_well_formed());
        c.speed_limit_kmh = 50.0;
        c.distance_km = -1.0;
        assert!(!c.is_well_formed());
    }

    #[test]
    fn track_kind_deserializes_unknown_as_other() {
        let kind: TrackKind = serde_json::from_str("\"turntable\"").unwrap();
        assert_eq!(kind, TrackKind::Other);
        let kind: TrackKind = serde_json::from_str("\"platform\"").unwrap();
        assert_eq!(kind, TrackKind::Platform);
    }

    #[test]
    fn connection_flags_default_to_true() {
        let json = r#"{"id":1,"from":"A","to":"B","distance_km":3.5,"speed_limit_kmh":40}"#;
        let c: Connection = serde_json::from_str(json).unwrap();
        assert!(c.bidirectional);
        assert!(c.active);
    }
}
