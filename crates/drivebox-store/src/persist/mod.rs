//! Snapshot persistence collaborator.
//!
//! The store persists its full node map after every committed mutation.
//! Persistence is fire-and-forget from the store's point of view: save
//! failures are logged by the caller, never propagated into the mutation
//! result.

use std::collections::HashMap;

use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::Node;

pub mod json_file;
pub mod memory;

pub use json_file::JsonSnapshotStore;
pub use memory::MemorySnapshotStore;

/// A durable key/value collaborator holding node-map snapshots.
pub trait SnapshotStore: Send + Sync + std::fmt::Debug {
    /// Load the most recent snapshot, or `None` if nothing was ever saved.
    fn load(&self) -> AppResult<Option<HashMap<NodeId, Node>>>;

    /// Replace the stored snapshot with the given node map.
    fn save(&self, nodes: &HashMap<NodeId, Node>) -> AppResult<()>;
}
