//! In-memory snapshot store, primarily for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::Node;

use super::SnapshotStore;

/// Snapshot store backed by process memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    /// The last saved snapshot.
    inner: Mutex<Option<HashMap<NodeId, Node>>>,
    /// Number of times `save` was called.
    save_count: AtomicUsize,
}

impl MemorySnapshotStore {
    /// Create an empty in-memory snapshot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a snapshot, as if previously saved.
    pub fn with_snapshot(nodes: HashMap<NodeId, Node>) -> Self {
        Self {
            inner: Mutex::new(Some(nodes)),
            save_count: AtomicUsize::new(0),
        }
    }

    /// Number of saves performed so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> AppResult<Option<HashMap<NodeId, Node>>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| AppError::persistence("snapshot mutex poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, nodes: &HashMap<NodeId, Node>) -> AppResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AppError::persistence("snapshot mutex poisoned"))?;
        *guard = Some(nodes.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
