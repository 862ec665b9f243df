//! Generation request parameters.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_AUTO_PREFIX;
use crate::domain::{ClockTime, StationId, is_valid_prefix};

/// Longest accepted name prefix; leaves room for a four-digit counter.
const MAX_PREFIX_LEN: usize = 28;

/// How generation chooses its routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RouteMode {
    /// The shortest route between one given pair of stations.
    Specific { from: StationId, to: StationId },

    /// Every synthesised multi-hop route.
    AllRoutes,

    /// A random sample of the synthesised routes.
    Random { count: usize },
}

/// Error returned for an unusable generation request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationConfigError {
    #[error("frequency must be at least one minute")]
    ZeroFrequency,

    #[error("end time {end} is before start time {start}")]
    EndBeforeStart { start: ClockTime, end: ClockTime },

    #[error("max speed must be positive, got {0}")]
    InvalidSpeed(f64),

    #[error("invalid train name prefix {0:?}")]
    InvalidPrefix(String),

    #[error("route endpoints must differ")]
    SameEndpoints,

    #[error("random route count must be at least one")]
    ZeroRouteCount,
}

/// A batch generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub route_mode: RouteMode,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub frequency_minutes: u32,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default = "default_train_type")]
    pub train_type: String,
    pub max_speed_kmh: f64,
    #[serde(default = "default_prefix")]
    pub train_name_prefix: String,
    /// Dwell at intermediate stops, replacing the stored default.
    #[serde(default)]
    pub default_waiting_time: Option<u32>,
    /// Seed for route synthesis; a fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_train_type() -> String {
    "regional".to_string()
}

fn default_prefix() -> String {
    DEFAULT_AUTO_PREFIX.to_string()
}

impl GenerationConfig {
    /// Check the request before any work is done.
    pub fn validate(&self) -> Result<(), GenerationConfigError> {
        if self.frequency_minutes == 0 {
            return Err(GenerationConfigError::ZeroFrequency);
        }
        if self.end_time < self.start_time {
            return Err(GenerationConfigError::EndBeforeStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if !(self.max_speed_kmh.is_finite() && self.max_speed_kmh > 0.0) {
            return Err(GenerationConfigError::InvalidSpeed(self.max_speed_kmh));
        }
        if !is_valid_prefix(&self.train_name_prefix) || self.train_name_prefix.len() > MAX_PREFIX_LEN
        {
            return Err(GenerationConfigError::InvalidPrefix(
                self.train_name_prefix.clone(),
            ));
        }
        match &self.route_mode {
            RouteMode::Specific { from, to } if from == to => {
                Err(GenerationConfigError::SameEndpoints)
            }
            RouteMode::Random { count: 0 } => Err(GenerationConfigError::ZeroRouteCount),
            _ => Ok(()),
        }
    }

    /// Departure slots: `start, start + freq, ...` up to and including `end`.
    pub fn slots(&self) -> Vec<ClockTime> {
        if self.frequency_minutes == 0 || self.end_time < self.start_time {
            return Vec::new();
        }
        let end = self.end_time.minute_of_day();
        (self.start_time.minute_of_day()..=end)
            .step_by(self.frequency_minutes as usize)
            .filter_map(ClockTime::from_minute_of_day)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse_hhmm(s).unwrap()
    }

    fn request() -> GenerationConfig {
        GenerationConfig {
            route_mode: RouteMode::AllRoutes,
            start_time: t("06:00"),
            end_time: t("07:00"),
            frequency_minutes: 20,
            bidirectional: false,
            train_type: "regional".into(),
            max_speed_kmh: 100.0,
            train_name_prefix: "AUTO-".into(),
            default_waiting_time: None,
            seed: Some(1),
        }
    }

    #[test]
    fn slots_include_end() {
        let slots = request().slots();
        assert_eq!(slots, vec![t("06:00"), t("06:20"), t("06:40"), t("07:00")]);
    }

    #[test]
    fn slots_stop_before_end_when_not_aligned() {
        let mut r = request();
        r.frequency_minutes = 25;
        assert_eq!(r.slots(), vec![t("06:00"), t("06:25"), t("06:50")]);
    }

    #[test]
    fn single_slot_when_start_equals_end() {
        let mut r = request();
        r.end_time = r.start_time;
        assert_eq!(r.slots(), vec![t("06:00")]);
    }

    #[test]
    fn validation() {
        assert!(request().validate().is_ok());

        let mut r = request();
        r.frequency_minutes = 0;
        assert_eq!(r.validate(), Err(GenerationConfigError::ZeroFrequency));

        let mut r = request();
        r.end_time = t("05:00");
        assert!(matches!(r.validate(), Err(GenerationConfigError::EndBeforeStart { .. })));

        let mut r = request();
        r.max_speed_kmh = -3.0;
        assert!(matches!(r.validate(), Err(GenerationConfigError::InvalidSpeed(_))));

        let mut r = request();
        r.train_name_prefix = "A B".into();
        assert!(matches!(r.validate(), Err(GenerationConfigError::InvalidPrefix(_))));

        let mut r = request();
        r.train_name_prefix = "P".repeat(29);
        assert!(matches!(r.validate(), Err(GenerationConfigError::InvalidPrefix(_))));

        let mut r = request();
        let a = StationId::parse("A").unwrap();
        r.route_mode = RouteMode::Specific { from: a, to: a };
        assert_eq!(r.validate(), Err(GenerationConfigError::SameEndpoints));

        let mut r = request();
        r.route_mode = RouteMode::Random { count: 0 };
        assert_eq!(r.validate(), Err(GenerationConfigError::ZeroRouteCount));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "route_mode": {"mode": "specific", "from": "A", "to": "C"},
            "start_time": "08:00",
            "end_time": "09:00",
            "frequency_minutes": 30,
            "max_speed_kmh": 90
        }"#;
        let r: GenerationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(r.train_name_prefix, "AUTO-");
        assert!(!r.bidirectional);
        assert!(r.seed.is_none());
        assert!(matches!(r.route_mode, RouteMode::Specific { .. }));
    }
}
