//! Locomotive double-booking.

use serde::Serialize;

use super::{Candidate, Conflict, TrainRef};
use crate::domain::{ClockTime, Locomotive, StationId, TimeWindow, Train};

/// A locomotive's assignment to one active train.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocomotiveBooking {
    pub train: TrainRef,
    pub from: StationId,
    pub to: StationId,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    /// `[departure, arrival + turnaround)`
    pub blocked: TimeWindow,
}

impl LocomotiveBooking {
    /// `[departure, arrival)`: the locomotive is out on the line.
    pub fn running(&self) -> TimeWindow {
        TimeWindow::new(self.departure, self.arrival)
    }
}

/// Every active assignment of the locomotive, in departure order.
pub fn bookings_for(locomotive: &Locomotive, trains: &[Train]) -> Vec<LocomotiveBooking> {
    let mut bookings: Vec<LocomotiveBooking> = trains
        .iter()
        .filter(|t| t.is_active)
        .filter(|t| t.locomotives.iter().any(|l| l.locomotive_id == locomotive.id))
        .map(|t| LocomotiveBooking {
            train: TrainRef::from(t),
            from: t.departure_station,
            to: t.arrival_station,
            departure: t.departure_time,
            arrival: t.arrival_time,
            blocked: TimeWindow::new(t.departure_time, t.arrival_time + locomotive.turnaround()),
        })
        .collect();
    bookings.sort_by_key(|b| (b.departure, b.train.id));
    bookings
}

/// Bookings that overlap the candidate's use of the locomotive.
///
/// Both sides block the locomotive from departure until turnaround after
/// arrival.
pub fn locomotive_conflicts(
    candidate: Candidate<'_>,
    locomotive: &Locomotive,
    existing: &[Train],
) -> Vec<Conflict> {
    let Some(window) = candidate.service_window() else {
        return Vec::new();
    };
    let blocked = TimeWindow::new(window.start, window.end + locomotive.turnaround());

    let others: Vec<Train> = existing.iter().filter(|t| !candidate.is(t)).cloned().collect();
    bookings_for(locomotive, &others)
        .into_iter()
        .filter_map(|booking| {
            let overlap = blocked.overlap(&booking.blocked)?;
            Some(Conflict::Locomotive {
                locomotive: locomotive.id,
                train: candidate.train_ref(),
                other: booking.train,
                window: overlap,
            })
        })
        .collect()
}

/// The booking holding the locomotive at `time`, if any.
pub fn booking_at(locomotive: &Locomotive, time: ClockTime, trains: &[Train]) -> Option<LocomotiveBooking> {
    bookings_for(locomotive, trains)
        .into_iter()
        .find(|b| b.blocked.contains(time))
}

/// True if the locomotive is neither running nor turning round at `time`.
pub fn is_locomotive_free(locomotive: &Locomotive, time: ClockTime, trains: &[Train]) -> bool {
    booking_at(locomotive, time, trains).is_none()
}
