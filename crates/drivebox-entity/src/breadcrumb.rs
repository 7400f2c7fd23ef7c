//! Breadcrumb trail entries.

use serde::{Deserialize, Serialize};

use drivebox_core::types::NodeId;

/// One entry in a root-first breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// The node this crumb points at.
    pub id: NodeId,
    /// The node's display name.
    pub name: String,
}

impl Breadcrumb {
    /// Create a breadcrumb entry.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
