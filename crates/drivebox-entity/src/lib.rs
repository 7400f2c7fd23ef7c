//! # drivebox-entity
//!
//! Domain entity models for Drivebox: the `Folder | File` node tagged
//! union, partial-update patches, breadcrumbs, and derived tree views.

pub mod breadcrumb;
pub mod node;
pub mod tree;

pub use breadcrumb::Breadcrumb;
pub use node::{ChildCounts, FileData, FileVersion, FolderData, Node, NodeKind, NodePatch};
pub use tree::NodeView;
