//! JSON file snapshot store.
//!
//! Snapshots are written to a sibling temp file first and renamed into
//! place, so a crash mid-write never truncates the previous snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use drivebox_core::error::{AppError, ErrorKind};
use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::Node;

use super::SnapshotStore;

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    /// Path of the snapshot file.
    path: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a snapshot store at the given path, creating parent
    /// directories as needed.
    pub fn new(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Persistence,
                    format!("Failed to create snapshot directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(Self { path })
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> AppResult<Option<HashMap<NodeId, Node>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to read snapshot: {}", self.path.display()),
                e,
            )
        })?;
        let nodes: HashMap<NodeId, Node> = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), nodes = nodes.len(), "Loaded snapshot");
        Ok(Some(nodes))
    }

    fn save(&self, nodes: &HashMap<NodeId, Node>) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(nodes)?;
        let tmp = self.temp_path();
        fs::write(&tmp, raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to write snapshot: {}", tmp.display()),
                e,
            )
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                format!("Failed to replace snapshot: {}", self.path.display()),
                e,
            )
        })?;
        debug!(path = %self.path.display(), nodes = nodes.len(), "Saved snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("snapshot.json")).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("snapshot.json")).unwrap();

        let mut nodes = HashMap::new();
        let root = Node::new_folder("Home", None, "/");
        let root_id = root.id;
        let file = Node::new_file("a.txt", root_id, "/a.txt", 12, Some("text/plain".into()));
        let file_id = file.id;
        nodes.insert(root_id, root);
        nodes.insert(file_id, file);

        store.save(&nodes).unwrap();
        let loaded = store.load().unwrap().expect("snapshot present");
        assert_eq!(loaded.len(), 2);
        assert!(loaded[&root_id].is_folder());
        assert!(loaded[&file_id].is_file());
        assert_eq!(loaded[&file_id].parent_id, Some(root_id));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("nested").join("snap.json");
        let store = JsonSnapshotStore::new(&nested).unwrap();
        store.save(&HashMap::new()).unwrap();
        assert!(nested.exists());
    }
}
