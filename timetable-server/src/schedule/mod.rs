//! Temporal scheduling: turning a route into stop times.

mod dwell;
mod timetable;

pub use dwell::{DwellDefaults, DwellPolicy};
pub use timetable::{Scheduler, TimetableError};
