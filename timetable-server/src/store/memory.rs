//! In-memory store with optional JSON persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::error::StoreError;
use super::snapshot::Snapshot;
use super::{DwellPolicyStore, LocomotiveStore, NetworkStore, TimetableStore};
use crate::domain::{Connection, ConnectionId, Locomotive, Station, Train, TrainDraft, TrainId};
use crate::schedule::DwellPolicy;

#[derive(Debug, Default)]
struct Inner {
    network_revision: u64,
    stations: Vec<Station>,
    connections: Vec<Connection>,
    locomotives: Vec<Locomotive>,
    dwell_policy: DwellPolicy,
    trains: BTreeMap<TrainId, Train>,
    next_id: u64,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            stations: self.stations.clone(),
            connections: self.connections.clone(),
            locomotives: self.locomotives.clone(),
            dwell_policy: self.dwell_policy.clone(),
            trains: self.trains.values().cloned().collect(),
        }
    }
}

/// A store holding everything in memory behind one lock.
///
/// When created with [`MemoryStore::open`], every change to the timetable
/// is written back to the snapshot file before the call returns. A failed
/// write undoes the change.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    persist_to: Option<PathBuf>,
}

impl MemoryStore {
    /// An empty store with no persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot.
    ///
    /// Trains that fail validation or reuse a number are dropped with a
    /// warning.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut trains = BTreeMap::new();
        let mut next_id = 0;
        for train in snapshot.trains {
            if let Err(e) = train.validate() {
                warn!(train = %train.number, error = %e, "dropping invalid train from snapshot");
                continue;
            }
            if trains.values().any(|t: &Train| t.number == train.number) {
                warn!(train = %train.number, "dropping duplicate train number from snapshot");
                continue;
            }
            next_id = next_id.max(train.id.0 + 1);
            trains.insert(train.id, train);
        }

        Self {
            inner: RwLock::new(Inner {
                network_revision: 1,
                stations: snapshot.stations,
                connections: snapshot.connections,
                locomotives: snapshot.locomotives,
                dwell_policy: snapshot.dwell_policy,
                trains,
                next_id,
            }),
            persist_to: None,
        }
    }

    /// Load from a snapshot file, creating an empty store when the file does
    /// not exist yet. Later changes are saved back to the same file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let snapshot = if path.exists() {
            Snapshot::load(path)?
        } else {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            Snapshot::default()
        };

        let mut store = Self::from_snapshot(snapshot);
        store.persist_to = Some(path.to_path_buf());
        Ok(store)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().snapshot()
    }

    /// Add or replace a station. Bumps the network revision.
    pub fn add_station(&self, station: Station) {
        let mut inner = self.inner.write();
        inner.stations.retain(|s| s.id != station.id);
        inner.stations.push(station);
        inner.network_revision += 1;
    }

    /// Add or replace a connection. Bumps the network revision.
    pub fn add_connection(&self, connection: Connection) {
        let mut inner = self.inner.write();
        inner.connections.retain(|c| c.id != connection.id);
        inner.connections.push(connection);
        inner.network_revision += 1;
    }

    /// Toggle a connection. Returns false if it does not exist.
    pub fn set_connection_active(&self, id: ConnectionId, active: bool) -> bool {
        let mut inner = self.inner.write();
        let Some(connection) = inner.connections.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        connection.active = active;
        inner.network_revision += 1;
        true
    }

    /// Add or replace a locomotive record.
    pub fn add_locomotive(&self, locomotive: Locomotive) {
        let mut inner = self.inner.write();
        inner.locomotives.retain(|l| l.id != locomotive.id);
        inner.locomotives.push(locomotive);
    }

    pub fn set_dwell_policy(&self, policy: DwellPolicy) {
        self.inner.write().dwell_policy = policy;
    }

    fn persist(&self, inner: &Inner) -> Result<(), StoreError> {
        match &self.persist_to {
            Some(path) => inner.snapshot().save(path),
            None => Ok(()),
        }
    }
}

impl NetworkStore for MemoryStore {
    fn network_revision(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().network_revision)
    }

    fn stations(&self) -> Result<Vec<Station>, StoreError> {
        Ok(self.inner.read().stations.clone())
    }

    fn connections(&self) -> Result<Vec<Connection>, StoreError> {
        let mut connections = self.inner.read().connections.clone();
        connections.sort_by_key(|c| c.id);
        Ok(connections)
    }
}

impl LocomotiveStore for MemoryStore {
    fn locomotives(&self) -> Result<Vec<Locomotive>, StoreError> {
        Ok(self.inner.read().locomotives.clone())
    }
}

impl DwellPolicyStore for MemoryStore {
    fn dwell_policy(&self) -> Result<DwellPolicy, StoreError> {
        Ok(self.inner.read().dwell_policy.clone())
    }
}

impl TimetableStore for MemoryStore {
    fn trains(&self) -> Result<Vec<Train>, StoreError> {
        Ok(self.inner.read().trains.values().cloned().collect())
    }

    fn commit(&self, draft: TrainDraft) -> Result<Train, StoreError> {
        let mut inner = self.inner.write();

        if inner.trains.values().any(|t| t.number == draft.number) {
            return Err(StoreError::DuplicateNumber(draft.number));
        }

        let id = TrainId(inner.next_id);
        let train = Train::from_draft(id, draft)?;
        inner.trains.insert(id, train.clone());

        if let Err(e) = self.persist(&inner) {
            inner.trains.remove(&id);
            return Err(e);
        }

        inner.next_id += 1;
        debug!(train = %train.number, id = %id, "committed train");
        Ok(train)
    }

    fn delete(&self, ids: &[TrainId]) -> Result<usize, StoreError> {
        let mut inner = self.inner.write();
        let removed: Vec<Train> = ids.iter().filter_map(|id| inner.trains.remove(id)).collect();

        if removed.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.persist(&inner) {
            for train in removed {
                inner.trains.insert(train.id, train);
            }
            return Err(e);
        }

        Ok(removed.len())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.write();
        let removed = std::mem::take(&mut inner.trains);

        if let Err(e) = self.persist(&inner) {
            inner.trains = removed;
            return Err(e);
        }

        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrainNumber;
    use crate::test_support::{abc_store, draft_abc};

    #[test]
    fn commit_assigns_ids_and_rejects_duplicates() {
        let store = abc_store();
        let first = store.commit(draft_abc("RE1", "08:00", 1)).unwrap();
        let second = store.commit(draft_abc("RE2", "09:00", 1)).unwrap();
        assert_ne!(first.id, second.id);

        let err = store.commit(draft_abc("RE1", "10:00", 1)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateNumber(_)));
        assert_eq!(store.trains().unwrap().len(), 2);
    }

    #[test]
    fn invalid_draft_leaves_nothing_behind() {
        let store = abc_store();
        let mut draft = draft_abc("RE1", "08:00", 1);
        draft.locomotives.clear();
        assert!(matches!(store.commit(draft), Err(StoreError::Invalid(_))));
        assert!(store.trains().unwrap().is_empty());
    }

    #[test]
    fn delete_and_clear() {
        let store = abc_store();
        let a = store.commit(draft_abc("RE1", "08:00", 1)).unwrap();
        store.commit(draft_abc("RE2", "09:00", 1)).unwrap();
        store.commit(draft_abc("RE3", "10:00", 1)).unwrap();

        assert_eq!(store.delete(&[a.id, TrainId(999)]).unwrap(), 1);
        assert_eq!(store.trains().unwrap().len(), 2);
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.trains().unwrap().is_empty());
    }

    #[test]
    fn network_changes_bump_revision() {
        let store = abc_store();
        let before = store.network_revision().unwrap();
        assert!(store.set_connection_active(ConnectionId(1), false));
        assert!(store.network_revision().unwrap() > before);
        assert!(!store.set_connection_active(ConnectionId(99), false));
    }

    #[test]
    fn persisted_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");

        let seed = abc_store().snapshot();
        seed.save(&path).unwrap();

        let store = MemoryStore::open(&path).unwrap();
        let train = store.commit(draft_abc("RE1", "08:00", 1)).unwrap();
        drop(store);

        let reopened = MemoryStore::open(&path).unwrap();
        let trains = reopened.trains().unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0], train);

        // Ids keep counting up after a reload
        let next = reopened.commit(draft_abc("RE2", "09:00", 1)).unwrap();
        assert!(next.id > train.id);
        assert_eq!(next.number, TrainNumber::parse("RE2").unwrap());
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("new.json")).unwrap();
        assert!(store.stations().unwrap().is_empty());
        assert!(store.trains().unwrap().is_empty());
    }
}
