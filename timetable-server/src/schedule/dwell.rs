//! Dwell-time policy.
//!
//! The policy is read from the dwell store once per request and passed
//! down explicitly; nothing here caches it between requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{StationId, StopType};

/// Default dwell minutes per stop type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellDefaults {
    pub origin: u32,
    pub intermediate: u32,
    pub technical: u32,
    pub destination: u32,
}

impl Default for DwellDefaults {
    fn default() -> Self {
        Self {
            origin: 0,
            intermediate: 2,
            technical: 1,
            destination: 0,
        }
    }
}

/// Snapshot of the dwell configuration for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellPolicy {
    #[serde(default)]
    pub defaults: DwellDefaults,

    /// Per-station dwell, applied at intermediate and technical stops.
    #[serde(default)]
    pub station_overrides: BTreeMap<StationId, u32>,
}

impl DwellPolicy {
    /// Layer caller-supplied per-station dwell on top of this snapshot.
    ///
    /// Caller values win over the stored overrides.
    pub fn with_overrides(&self, overrides: &BTreeMap<StationId, u32>) -> DwellPolicy {
        let mut merged = self.clone();
        merged
            .station_overrides
            .extend(overrides.iter().map(|(k, v)| (*k, *v)));
        merged
    }

    /// Replace the intermediate-stop default.
    pub fn with_intermediate_default(mut self, minutes: u32) -> DwellPolicy {
        self.defaults.intermediate = minutes;
        self
    }

    /// Minutes a train stands at `station` for a stop of the given type.
    pub fn minutes_for(&self, station: &StationId, stop_type: StopType) -> u32 {
        match stop_type {
            StopType::Origin => self.defaults.origin,
            StopType::Destination => self.defaults.destination,
            StopType::Intermediate => self
                .station_overrides
                .get(station)
                .copied()
                .unwrap_or(self.defaults.intermediate),
            StopType::Technical => self
                .station_overrides
                .get(station)
                .copied()
                .unwrap_or(self.defaults.technical),
        }
    }
}
