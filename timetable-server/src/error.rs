//! Caller-facing error taxonomy.

use crate::conflict::Conflict;
use crate::domain::{InvalidStationId, InvalidTrainNumber, StationId, TimeError};
use crate::generation::GenerationConfigError;
use crate::schedule::TimetableError;
use crate::service::CallerRole;
use crate::store::StoreError;

/// Every way an engine operation can be rejected.
///
/// Each variant carries enough detail for the caller to act on;
/// [`EngineError::kind`] gives a stable machine-readable name.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input, rejected before any computation
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("no route from {from} to {to}")]
    RouteNotFound { from: StationId, to: StationId },

    /// The full list of conflicts that blocked the operation
    #[error("{} conflict(s) found", .0.len())]
    Conflict(Vec<Conflict>),

    /// No locomotive could be found
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("{role} may not {action}")]
    Forbidden {
        role: CallerRole,
        action: &'static str,
    },

    /// Underlying store failure; the detail is for logs only
    #[error("persistence failure")]
    Persistence(#[from] StoreError),
}

impl EngineError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::RouteNotFound { .. } => "route_not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::ResourceUnavailable(_) => "resource_unavailable",
            EngineError::Forbidden { .. } => "forbidden",
            EngineError::Persistence(_) => "persistence",
        }
    }
}

impl From<InvalidStationId> for EngineError {
    fn from(e: InvalidStationId) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<InvalidTrainNumber> for EngineError {
    fn from(e: InvalidTrainNumber) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<TimeError> for EngineError {
    fn from(e: TimeError) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<TimetableError> for EngineError {
    fn from(e: TimetableError) -> Self {
        EngineError::Validation(e.to_string())
    }
}

impl From<GenerationConfigError> for EngineError {
    fn from(e: GenerationConfigError) -> Self {
        EngineError::Validation(e.to_string())
    }
}
