//! Conflict detection.
//!
//! Three independent checks, each returning a list rather than failing:
//! segment overlaps, station track capacity and locomotive double-booking.
//! [`ConflictDetector`] bundles them for a candidate train and for a
//! read-only audit of the whole timetable.

mod capacity;
mod detector;
mod locomotive;
mod segment;

use serde::Serialize;

use crate::domain::{
    LocomotiveId, SegmentKey, StationId, Stop, TimeWindow, Train, TrainDraft, TrainId, TrainNumber,
};

pub use capacity::capacity_conflicts;
pub use detector::{ConflictDetector, ConflictReport};
pub use locomotive::{
    LocomotiveBooking, booking_at, bookings_for, is_locomotive_free, locomotive_conflicts,
};
pub use segment::{segment_conflicts, segment_overlaps};

/// Identifies a train in a conflict. Candidates have no id yet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TrainRef {
    pub id: Option<TrainId>,
    pub number: TrainNumber,
}

impl From<&Train> for TrainRef {
    fn from(train: &Train) -> Self {
        Self {
            id: Some(train.id),
            number: train.number.clone(),
        }
    }
}

/// One detected collision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// Two trains on the same segment at the same time.
    Segment {
        segment: SegmentKey,
        train: TrainRef,
        other: TrainRef,
        window: TimeWindow,
    },

    /// More trains around a stop than the station has usable tracks.
    Capacity {
        station: StationId,
        train: TrainRef,
        window: TimeWindow,
        capacity: usize,
        occupied_by: Vec<TrainRef>,
    },

    /// The schedule calls at a station with no active track.
    NoActiveTracks { station: StationId, train: TrainRef },

    /// A locomotive booked on two trains at once.
    Locomotive {
        locomotive: LocomotiveId,
        train: TrainRef,
        other: TrainRef,
        window: TimeWindow,
    },
}

impl Conflict {
    /// Machine-readable conflict kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Conflict::Segment { .. } => "segment",
            Conflict::Capacity { .. } => "capacity",
            Conflict::NoActiveTracks { .. } => "no_active_tracks",
            Conflict::Locomotive { .. } => "locomotive",
        }
    }
}

/// A schedule under test: either a draft or a persisted train.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub id: Option<TrainId>,
    pub number: &'a TrainNumber,
    pub stops: &'a [Stop],
    pub lead: Option<LocomotiveId>,
}

impl<'a> Candidate<'a> {
    pub fn train_ref(&self) -> TrainRef {
        TrainRef {
            id: self.id,
            number: self.number.clone(),
        }
    }

    /// True if `train` is this candidate (and so never conflicts with it).
    fn is(&self, train: &Train) -> bool {
        self.id == Some(train.id) || *self.number == train.number
    }

    /// `[first departure, last arrival)`.
    fn service_window(&self) -> Option<TimeWindow> {
        Some(TimeWindow::new(self.stops.first()?.departure, self.stops.last()?.arrival))
    }
}

impl<'a> From<&'a Train> for Candidate<'a> {
    fn from(train: &'a Train) -> Self {
        Self {
            id: Some(train.id),
            number: &train.number,
            stops: &train.stops,
            lead: train.lead_locomotive(),
        }
    }
}

impl<'a> From<&'a TrainDraft> for Candidate<'a> {
    fn from(draft: &'a TrainDraft) -> Self {
        Self {
            id: None,
            number: &draft.number,
            stops: &draft.stops,
            lead: draft.lead_locomotive(),
        }
    }
}
