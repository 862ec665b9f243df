//! Train, schedule and stop types.
//!
//! A `Train` is the persisted aggregate the timetable engine produces: the
//! train header, its ordered schedule of stops and its locomotive
//! assignment. A `TrainDraft` is the same aggregate before the store has
//! given it an id.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ClockTime, LocomotiveId, ScheduleError, SegmentKey, StationId, TimeWindow, TrainNumber};

/// Identifier of a persisted train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub u64);

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a stop within a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    Origin,
    Intermediate,
    Destination,
    Technical,
}

/// One call of a train at a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub station: StationId,
    pub sequence: u32,
    pub arrival: ClockTime,
    pub departure: ClockTime,
    pub dwell_minutes: u32,
    pub stop_type: StopType,
}

impl Stop {
    /// Origin and destination stops have no dwell: arrival equals departure.
    pub fn is_terminus(&self) -> bool {
        self.arrival == self.departure
    }
}

/// A locomotive attached to a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocomotiveAssignment {
    pub locomotive_id: LocomotiveId,
    pub is_lead: bool,
}

impl LocomotiveAssignment {
    pub fn lead(locomotive_id: LocomotiveId) -> Self {
        Self {
            locomotive_id,
            is_lead: true,
        }
    }
}

/// The run of a train between two consecutive stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub from: StationId,
    pub to: StationId,
    pub segment: SegmentKey,
    /// `[departure from `from`, arrival at `to`)`
    pub window: TimeWindow,
}

/// Legs between consecutive stops.
pub fn legs(stops: &[Stop]) -> impl Iterator<Item = Leg> + '_ {
    stops.windows(2).map(|pair| Leg {
        from: pair[0].station,
        to: pair[1].station,
        segment: SegmentKey::new(pair[0].station, pair[1].station),
        window: TimeWindow::new(pair[0].departure, pair[1].arrival),
    })
}

/// Check the schedule invariants of an ordered stop list.
pub fn validate_stops(stops: &[Stop]) -> Result<(), ScheduleError> {
    if stops.len() < 2 {
        return Err(ScheduleError::TooFewStops);
    }

    for (idx, stop) in stops.iter().enumerate() {
        if stop.sequence as usize != idx {
            return Err(ScheduleError::BadSequence);
        }
        if stop.departure < stop.arrival {
            return Err(ScheduleError::DepartureBeforeArrival {
                station: stop.station,
                sequence: stop.sequence,
            });
        }
    }

    for pair in stops.windows(2) {
        if pair[1].arrival <= pair[0].departure {
            return Err(ScheduleError::OutOfOrder {
                station: pair[1].station,
                sequence: pair[1].sequence,
            });
        }
    }

    Ok(())
}

/// A train aggregate that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainDraft {
    pub number: TrainNumber,
    #[serde(default)]
    pub train_type: String,
    pub max_speed_kmh: f64,
    pub stops: Vec<Stop>,
    pub locomotives: Vec<LocomotiveAssignment>,
}

impl TrainDraft {
    /// Validate the schedule and the locomotive assignment.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        validate_stops(&self.stops)?;
        if self.locomotives.iter().filter(|l| l.is_lead).count() != 1 {
            return Err(ScheduleError::LeadLocomotive);
        }
        Ok(())
    }

    /// The lead locomotive, if exactly one is marked lead.
    pub fn lead_locomotive(&self) -> Option<LocomotiveId> {
        lead_of(&self.locomotives)
    }

    /// Departure from the first stop to arrival at the last.
    pub fn service_window(&self) -> Option<TimeWindow> {
        service_window_of(&self.stops)
    }

    /// Legs between consecutive stops.
    pub fn legs(&self) -> impl Iterator<Item = Leg> + '_ {
        legs(&self.stops)
    }
}

/// A persisted train with its schedule and locomotive assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub number: TrainNumber,
    #[serde(default)]
    pub train_type: String,
    pub departure_station: StationId,
    pub arrival_station: StationId,
    pub departure_time: ClockTime,
    pub arrival_time: ClockTime,
    pub max_speed_kmh: f64,
    pub is_active: bool,
    pub stops: Vec<Stop>,
    pub locomotives: Vec<LocomotiveAssignment>,
}

impl Train {
    /// Build the persisted form of a validated draft.
    ///
    /// The header (end stations and times) is derived from the first and
    /// last stop so it cannot disagree with the schedule.
    pub fn from_draft(id: TrainId, draft: TrainDraft) -> Result<Self, ScheduleError> {
        draft.validate()?;
        let (first, last) = match (draft.stops.first(), draft.stops.last()) {
            (Some(f), Some(l)) => (f.clone(), l.clone()),
            _ => return Err(ScheduleError::TooFewStops),
        };

        Ok(Train {
            id,
            number: draft.number,
            train_type: draft.train_type,
            departure_station: first.station,
            arrival_station: last.station,
            departure_time: first.departure,
            arrival_time: last.arrival,
            max_speed_kmh: draft.max_speed_kmh,
            is_active: true,
            stops: draft.stops,
            locomotives: draft.locomotives,
        })
    }

    /// Check the header agrees with the schedule.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        validate_stops(&self.stops)?;
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(ScheduleError::TooFewStops),
        };
        if first.station != self.departure_station {
            return Err(ScheduleError::HeaderMismatch("departure station"));
        }
        if last.station != self.arrival_station {
            return Err(ScheduleError::HeaderMismatch("arrival station"));
        }
        if first.departure != self.departure_time {
            return Err(ScheduleError::HeaderMismatch("departure time"));
        }
        if last.arrival != self.arrival_time {
            return Err(ScheduleError::HeaderMismatch("arrival time"));
        }
        if lead_of(&self.locomotives).is_none() {
            return Err(ScheduleError::LeadLocomotive);
        }
        Ok(())
    }

    /// The lead locomotive, if exactly one is marked lead.
    pub fn lead_locomotive(&self) -> Option<LocomotiveId> {
        lead_of(&self.locomotives)
    }

    /// True if the train was created by the generator (name-prefix convention).
    pub fn is_auto_generated(&self, prefix: &str) -> bool {
        self.number.has_prefix(prefix)
    }

    /// `[departure, arrival)` of the whole run.
    pub fn service_window(&self) -> TimeWindow {
        TimeWindow::new(self.departure_time, self.arrival_time)
    }

    /// Legs between consecutive stops.
    pub fn legs(&self) -> impl Iterator<Item = Leg> + '_ {
        legs(&self.stops)
    }

    /// First call at a station, if the train stops there.
    pub fn stop_at(&self, station: &StationId) -> Option<&Stop> {
        self.stops.iter().find(|s| &s.station == station)
    }
}

fn lead_of(locomotives: &[LocomotiveAssignment]) -> Option<LocomotiveId> {
    let mut leads = locomotives.iter().filter(|l| l.is_lead);
    match (leads.next(), leads.next()) {
        (Some(lead), None) => Some(lead.locomotive_id),
        _ => None,
    }
}

fn service_window_of(stops: &[Stop]) -> Option<TimeWindow> {
    Some(TimeWindow::new(stops.first()?.departure, stops.last()?.arrival))
}
