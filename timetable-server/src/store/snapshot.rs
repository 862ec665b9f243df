//! JSON snapshot of the whole store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::StoreError;
use crate::domain::{Connection, Locomotive, Station, Train};
use crate::schedule::DwellPolicy;

/// Everything the memory store holds, in file form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub locomotives: Vec<Locomotive>,
    #[serde(default)]
    pub dwell_policy: DwellPolicy,
    #[serde(default)]
    pub trains: Vec<Train>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&json).map_err(|e| StoreError::Format {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Save the snapshot as pretty-printed JSON.
    ///
    /// Creates parent directories if they don't exist. The file is written
    /// to a sibling temporary path first and then renamed into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                message: format!("failed to create snapshot directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| StoreError::Format {
            message: format!("failed to serialize snapshot: {}", e),
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io {
            message: format!("failed to write snapshot file: {}", e),
        })?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::Io {
            message: format!("failed to replace snapshot file: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connection, locomotive, station};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timetable.json");

        let snapshot = Snapshot {
            stations: vec![station("A", 2), station("B", 1)],
            connections: vec![connection(1, "A", "B", 10.0, 50.0)],
            locomotives: vec![locomotive(1, 3)],
            ..Default::default()
        };
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.stations, snapshot.stations);
        assert_eq!(loaded.connections, snapshot.connections);
        assert_eq!(loaded.locomotives, snapshot.locomotives);
        assert!(loaded.trains.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Snapshot::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }

    #[test]
    fn empty_object_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert!(loaded.stations.is_empty());
        assert_eq!(loaded.dwell_policy, DwellPolicy::default());
    }
}
