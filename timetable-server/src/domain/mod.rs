//! Domain types for the layout timetable.
//!
//! This module contains the core domain model: validated identifiers, the
//! model clock, layout reference records and the train aggregate. Types
//! enforce their invariants at construction time, so code that receives
//! them can trust their validity.

mod error;
mod layout;
mod locomotive;
mod station;
mod time;
mod train;
mod train_number;

pub use error::ScheduleError;
pub use layout::{Connection, ConnectionId, SegmentKey, Station, Track, TrackId, TrackKind};
pub use locomotive::{DEFAULT_TURNAROUND_MINUTES, DccAddress, Locomotive, LocomotiveId};
pub use station::{InvalidStationId, MAX_STATION_ID_LEN, StationId};
pub use time::{ClockTime, MINUTES_PER_DAY, TimeError, TimeWindow, times_overlap};
pub use train::{
    Leg, LocomotiveAssignment, Stop, StopType, Train, TrainDraft, TrainId, legs, validate_stops,
};
pub use train_number::{InvalidTrainNumber, TrainNumber, is_valid_prefix};
