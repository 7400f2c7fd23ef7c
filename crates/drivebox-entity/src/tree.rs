//! Derived tree views for hierarchical display.

use serde::{Deserialize, Serialize};

use drivebox_core::types::NodeId;

/// A node in a derived display tree. Built on demand from the flat arena,
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
    /// Node ID.
    pub id: NodeId,
    /// Node name.
    pub name: String,
    /// Cached full path.
    pub path: String,
    /// Whether the node is a folder.
    pub is_folder: bool,
    /// Size in bytes (file size, or a folder's direct aggregate).
    pub size_bytes: u64,
    /// Child views (folders may recurse; files are always leaves).
    pub children: Vec<NodeView>,
}

impl NodeView {
    /// Total number of nodes in this view, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeView::node_count).sum::<usize>()
    }
}
