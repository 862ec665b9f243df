//! Locomotive resolution.
//!
//! Picks a locomotive that is physically at the departure station and has
//! finished its turnaround. Where a locomotive is comes from its
//! assignment history: the arrival station of its last assignment.

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::conflict::{LocomotiveBooking, bookings_for};
use crate::domain::{ClockTime, Locomotive, StationId, Train};

/// Which rule set admitted the locomotive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Relaxed,
}

/// A resolved locomotive.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub locomotive: &'a Locomotive,
    pub tier: Tier,
}

/// Why a locomotive was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    MidJourney,
    Turnaround,
    Repositioning,
}

/// Chooses locomotives for new departures.
pub struct LocomotiveResolver<'a> {
    locomotives: &'a [Locomotive],
    trains: &'a [Train],
    config: &'a EngineConfig,
}

impl<'a> LocomotiveResolver<'a> {
    pub fn new(locomotives: &'a [Locomotive], trains: &'a [Train], config: &'a EngineConfig) -> Self {
        Self {
            locomotives,
            trains,
            config,
        }
    }

    /// Find a locomotive for a departure from `station` at `time`.
    ///
    /// Primary tier candidates are ranked by how many trains they already
    /// work, then by DCC address. The relaxed tier is consulted when the
    /// primary tier is empty unless the config turns it off.
    pub fn resolve(&self, station: StationId, time: ClockTime) -> Option<Resolution<'a>> {
        let mut eligible: Vec<(usize, &'a Locomotive)> = Vec::new();

        for locomotive in self.locomotives {
            let bookings = bookings_for(locomotive, self.trains);
            match self.primary_check(locomotive, &bookings, station, time) {
                Ok(()) => eligible.push((bookings.len(), locomotive)),
                Err(reason) => {
                    trace!(locomotive = %locomotive.id, ?reason, %station, %time, "locomotive rejected");
                }
            }
        }

        eligible.sort_by_key(|(usage, l)| (*usage, l.dcc_address));
        if let Some(&(usage, locomotive)) = eligible.first() {
            debug!(locomotive = %locomotive.id, usage, %station, %time, "resolved locomotive");
            return Some(Resolution {
                locomotive,
                tier: Tier::Primary,
            });
        }

        if !self.config.relaxed_locomotive_fallback {
            debug!(%station, %time, "no locomotive available");
            return None;
        }

        let fallback = self
            .locomotives
            .iter()
            .filter(|l| self.relaxed_check(&bookings_for(l, self.trains), time))
            .min_by_key(|l| l.dcc_address)?;

        debug!(locomotive = %fallback.id, %station, %time, "resolved locomotive via relaxed tier");
        Some(Resolution {
            locomotive: fallback,
            tier: Tier::Relaxed,
        })
    }

    fn primary_check(
        &self,
        locomotive: &Locomotive,
        bookings: &[LocomotiveBooking],
        station: StationId,
        time: ClockTime,
    ) -> Result<(), Rejection> {
        if bookings.iter().any(|b| b.running().contains(time)) {
            return Err(Rejection::MidJourney);
        }

        let Some(last) = last_arrival(bookings, time) else {
            // No history before this time: depot-available anywhere
            return Ok(());
        };

        let idle = time.signed_minutes_since(last.arrival);
        if idle < locomotive.turnaround_minutes as i64 {
            return Err(Rejection::Turnaround);
        }
        if last.to != station && idle < self.config.repositioning_mins {
            return Err(Rejection::Repositioning);
        }
        Ok(())
    }

    fn relaxed_check(&self, bookings: &[LocomotiveBooking], time: ClockTime) -> bool {
        !bookings.iter().any(|b| b.running().contains(time)) && !bookings.iter().any(|b| b.arrival > time)
    }
}

/// The assignment with the latest arrival at or before `time`.
fn last_arrival(bookings: &[LocomotiveBooking], time: ClockTime) -> Option<&LocomotiveBooking> {
    bookings
        .iter()
        .filter(|b| b.arrival <= time && !b.running().crosses_midnight())
        .max_by_key(|b| b.arrival)
}
