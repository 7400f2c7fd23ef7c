//! Node entities for the virtual file tree.

pub mod model;
pub mod patch;

pub use model::{ChildCounts, FileData, FileVersion, FolderData, Node, NodeKind};
pub use patch::NodePatch;
