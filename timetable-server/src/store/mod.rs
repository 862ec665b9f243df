//! Store contracts and the in-memory implementation.
//!
//! The engine reads reference data (stations, connections, locomotives,
//! dwell policy) and reads and writes its own output (trains) only through
//! these traits. Reference data is owned by external managers.

mod error;
mod memory;
mod snapshot;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;

use crate::domain::{Connection, Locomotive, Station, Train, TrainDraft, TrainId};
use crate::schedule::DwellPolicy;

/// Read access to stations, tracks and connections.
pub trait NetworkStore: Send + Sync {
    /// Changes whenever a station or connection changes.
    fn network_revision(&self) -> Result<u64, StoreError>;

    fn stations(&self) -> Result<Vec<Station>, StoreError>;

    fn connections(&self) -> Result<Vec<Connection>, StoreError>;
}

/// Read access to locomotive records.
pub trait LocomotiveStore: Send + Sync {
    fn locomotives(&self) -> Result<Vec<Locomotive>, StoreError>;
}

/// Read access to the dwell-time configuration.
pub trait DwellPolicyStore: Send + Sync {
    /// A snapshot for the current request.
    fn dwell_policy(&self) -> Result<DwellPolicy, StoreError>;
}

/// The engine's own output: trains with schedules and assignments.
pub trait TimetableStore: Send + Sync {
    /// All trains, ordered by id.
    fn trains(&self) -> Result<Vec<Train>, StoreError>;

    /// Persist a train aggregate atomically.
    ///
    /// Either the train, its schedule and its locomotive assignment are all
    /// stored, or nothing is.
    fn commit(&self, draft: TrainDraft) -> Result<Train, StoreError>;

    /// Delete trains with their schedules and assignments.
    ///
    /// Returns how many were deleted; unknown ids are ignored.
    fn delete(&self, ids: &[TrainId]) -> Result<usize, StoreError>;

    /// Delete every train. Returns how many were deleted.
    fn clear(&self) -> Result<usize, StoreError>;
}

/// Everything the timetable service needs from persistence.
pub trait Backend: NetworkStore + LocomotiveStore + DwellPolicyStore + TimetableStore {}

impl<T> Backend for T where T: NetworkStore + LocomotiveStore + DwellPolicyStore + TimetableStore {}
