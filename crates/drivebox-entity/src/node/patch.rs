//! Partial node updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drivebox_core::types::NodeId;

/// A partial update merged into an existing node by the store.
///
/// Only the fields that are `Some` are applied. The store always stamps
/// `modified_at` when a patch is applied, so idempotent operations must
/// short-circuit before building a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePatch {
    /// New display name.
    pub name: Option<String>,
    /// New parent folder. A node never loses its parent, so this sets,
    /// never clears.
    pub parent_id: Option<NodeId>,
    /// New cached path.
    pub path: Option<String>,
    /// New trashed flag.
    pub trashed: Option<bool>,
    /// New starred flag.
    pub starred: Option<bool>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Replacement metadata payload.
    pub metadata: Option<serde_json::Value>,
    /// New last-accessed timestamp.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl NodePatch {
    /// A patch that renames a node and rewrites its cached path.
    pub fn rename(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A patch that reparents a node and rewrites its cached path.
    pub fn reparent(parent_id: NodeId, path: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id),
            path: Some(path.into()),
            ..Self::default()
        }
    }
}
