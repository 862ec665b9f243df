//! Domain error types.
//!
//! These errors represent broken schedule invariants in the domain layer.
//! They are distinct from storage and transport errors.

use super::StationId;

/// Invariant violations found when validating a train's schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A schedule needs an origin and a destination
    #[error("schedule must have at least two stops")]
    TooFewStops,

    /// Departure earlier than arrival at the same stop
    #[error("stop {sequence} at {station}: departure before arrival")]
    DepartureBeforeArrival { station: StationId, sequence: u32 },

    /// Next stop is reached before this one is left
    #[error("stop {sequence} at {station}: arrival before departure from the previous stop")]
    OutOfOrder { station: StationId, sequence: u32 },

    /// Stop sequence numbers must count up from zero
    #[error("stop sequence numbers are not contiguous")]
    BadSequence,

    /// Header stations/times disagree with the first or last stop
    #[error("train header does not match its schedule: {0}")]
    HeaderMismatch(&'static str),

    /// Every train carries exactly one lead locomotive
    #[error("train must have exactly one lead locomotive")]
    LeadLocomotive,
}
