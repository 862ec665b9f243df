//! Engine and server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

/// Name prefix marking trains created by the generator.
pub const DEFAULT_AUTO_PREFIX: &str = "AUTO-";

/// Tuning parameters shared by the scheduling, conflict and allocation
/// components.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Buffer either side of a stop when checking station capacity (minutes).
    pub station_buffer_mins: i64,

    /// Minimum occupancy assumed for a terminus stop (minutes).
    /// Applied when arrival equals departure.
    pub terminus_floor_mins: i64,

    /// Keep one track free for emergencies at stations with more than one
    /// active track.
    pub reserve_track: bool,

    /// Time a locomotive needs to get from its last arrival station to a
    /// different departure station (minutes).
    pub repositioning_mins: i64,

    /// Turnaround between an outbound arrival and the generated return leg
    /// (minutes).
    pub return_turnaround_mins: i64,

    /// Width of the windows the capacity resolver buckets trains into
    /// (minutes).
    pub capacity_bucket_mins: u32,

    /// Slowest speed a train is scheduled at on any segment.
    pub min_segment_speed_kmh: f64,

    /// Upper bound on routes synthesised for the all-routes mode.
    pub max_synthesized_routes: usize,

    /// Shortest synthesised route, in stations.
    pub min_route_stations: usize,

    /// Longest synthesised route, in stations.
    pub max_route_stations: usize,

    /// Name prefix identifying auto-generated trains.
    pub auto_prefix: String,

    /// Consult the relaxed locomotive tier, which ignores where a locomotive
    /// last arrived, when the primary tier finds nothing.
    pub relaxed_locomotive_fallback: bool,
}

impl EngineConfig {
    /// Returns the station buffer as a Duration.
    pub fn station_buffer(&self) -> Duration {
        Duration::minutes(self.station_buffer_mins)
    }

    /// Returns the terminus occupancy floor as a Duration.
    pub fn terminus_floor(&self) -> Duration {
        Duration::minutes(self.terminus_floor_mins)
    }

    /// Returns the repositioning allowance as a Duration.
    pub fn repositioning(&self) -> Duration {
        Duration::minutes(self.repositioning_mins)
    }

    /// Returns the return-leg turnaround as a Duration.
    pub fn return_turnaround(&self) -> Duration {
        Duration::minutes(self.return_turnaround_mins)
    }

    /// Number of trains a station with `active_tracks` tracks may hold at once.
    pub fn effective_capacity(&self, active_tracks: usize) -> usize {
        if self.reserve_track && active_tracks > 1 {
            active_tracks - 1
        } else {
            active_tracks
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            station_buffer_mins: 15,
            terminus_floor_mins: 30,
            reserve_track: true,
            repositioning_mins: 60,
            return_turnaround_mins: 15,
            capacity_bucket_mins: 30,
            min_segment_speed_kmh: 30.0,
            max_synthesized_routes: 50,
            min_route_stations: 2,
            max_route_stations: 4,
            auto_prefix: DEFAULT_AUTO_PREFIX.to_string(),
            relaxed_locomotive_fallback: true,
        }
    }
}

/// Error reading server configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TIMETABLE_ADDR is not a socket address: {0}")]
    Addr(String),

    #[error("TIMETABLE_SEED is not an unsigned integer: {0}")]
    Seed(String),
}

/// Process-level settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,

    /// JSON snapshot to load at startup and save after changes.
    pub data_path: Option<PathBuf>,

    /// Default seed for route synthesis when a request gives none.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_path: None,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Read `TIMETABLE_ADDR`, `TIMETABLE_DATA` and `TIMETABLE_SEED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("TIMETABLE_ADDR") {
            config.addr = addr.parse().map_err(|_| ConfigError::Addr(addr))?;
        }

        config.data_path = lookup("TIMETABLE_DATA")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        if let Some(seed) = lookup("TIMETABLE_SEED") {
            config.seed = Some(seed.parse().map_err(|_| ConfigError::Seed(seed))?);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.station_buffer_mins, 15);
        assert_eq!(config.terminus_floor_mins, 30);
        assert_eq!(config.repositioning_mins, 60);
        assert_eq!(config.return_turnaround_mins, 15);
        assert_eq!(config.capacity_bucket_mins, 30);
        assert_eq!(config.max_synthesized_routes, 50);
        assert_eq!(config.auto_prefix, "AUTO-");
        assert!(config.relaxed_locomotive_fallback);
    }

    #[test]
    fn duration_methods() {
        let config = EngineConfig::default();

        assert_eq!(config.station_buffer(), Duration::minutes(15));
        assert_eq!(config.terminus_floor(), Duration::minutes(30));
        assert_eq!(config.repositioning(), Duration::minutes(60));
        assert_eq!(config.return_turnaround(), Duration::minutes(15));
    }

    #[test]
    fn reserve_track_rule() {
        let mut config = EngineConfig::default();
        assert_eq!(config.effective_capacity(0), 0);
        assert_eq!(config.effective_capacity(1), 1);
        assert_eq!(config.effective_capacity(2), 1);
        assert_eq!(config.effective_capacity(5), 4);

        config.reserve_track = false;
        assert_eq!(config.effective_capacity(2), 2);
    }

    #[test]
    fn server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            "TIMETABLE_ADDR" => Some("0.0.0.0:8080".into()),
            "TIMETABLE_DATA" => Some("/tmp/timetable.json".into()),
            "TIMETABLE_SEED" => Some("42".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/timetable.json")));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn server_config_defaults_and_errors() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert!(config.data_path.is_none());

        let err = ServerConfig::from_lookup(|key| (key == "TIMETABLE_SEED").then(|| "x".into()));
        assert!(matches!(err, Err(ConfigError::Seed(_))));

        let err = ServerConfig::from_lookup(|key| (key == "TIMETABLE_ADDR").then(|| "nope".into()));
        assert!(matches!(err, Err(ConfigError::Addr(_))));
    }
}
