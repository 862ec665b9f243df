//! Locomotive reference records.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Turnaround applied when the locomotive manager has none on record.
pub const DEFAULT_TURNAROUND_MINUTES: u32 = 10;

/// Identifier of a locomotive within the locomotive database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocomotiveId(pub u32);

impl fmt::Display for LocomotiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// DCC decoder address; unique per locomotive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DccAddress(pub u16);

impl fmt::Display for DccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A locomotive as the timetable sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locomotive {
    pub id: LocomotiveId,
    #[serde(default)]
    pub name: String,
    pub dcc_address: DccAddress,
    pub max_speed_kmh: f64,
    #[serde(default = "default_turnaround")]
    pub turnaround_minutes: u32,
}

impl Locomotive {
    /// Minimum idle time after an arrival before the next departure.
    pub fn turnaround(&self) -> Duration {
        Duration::minutes(self.turnaround_minutes as i64)
    }
}

fn default_turnaround() -> u32 {
    DEFAULT_TURNAROUND_MINUTES
}
