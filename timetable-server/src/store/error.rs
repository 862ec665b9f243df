//! Store error types.

use crate::domain::{ScheduleError, TrainNumber};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A train with this number already exists
    #[error("train number {0} is already in use")]
    DuplicateNumber(TrainNumber),

    /// The aggregate failed validation on commit
    #[error("invalid train aggregate: {0}")]
    Invalid(#[from] ScheduleError),

    /// Reading or writing the snapshot file failed
    #[error("snapshot i/o error: {message}")]
    Io { message: String },

    /// Snapshot contents could not be (de)serialized
    #[error("snapshot format error: {message}")]
    Format { message: String },

    /// The backing store is not reachable
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}
