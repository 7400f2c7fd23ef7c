//! Node entity model.
//!
//! A node is either a folder or a file. Both variants share the base shape
//! (identifier, name, parent back-reference, cached path, timestamps); the
//! variant-specific payload lives in [`NodeKind`]. The `parent_id` chain is
//! the source of truth for the tree structure; `path` is a cached
//! projection maintained by the mutation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drivebox_core::types::NodeId;

/// A node in the virtual file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier, immutable after creation.
    pub id: NodeId,
    /// Parent folder ID (`None` only for the single root folder).
    pub parent_id: Option<NodeId>,
    /// Display name. Non-empty, free of reserved characters.
    pub name: String,
    /// Cached full path (e.g. `/documents/reports`); root is `/`.
    pub path: String,
    /// Soft-delete flag. Carried, not interpreted, by the tree core.
    #[serde(default)]
    pub trashed: bool,
    /// Whether the node is starred. Opaque payload.
    #[serde(default)]
    pub starred: bool,
    /// Free-form tags. Opaque payload.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Arbitrary metadata (JSON). Opaque payload.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last modified.
    pub modified_at: DateTime<Utc>,
    /// When the node was last accessed (navigation, download).
    pub last_accessed_at: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Variant-specific node payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A folder that may contain child nodes.
    Folder(FolderData),
    /// A file leaf.
    File(FileData),
}

/// Folder-specific payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderData {
    /// Direct child counts, recomputed after membership changes.
    #[serde(default)]
    pub counts: ChildCounts,
    /// Aggregate size of direct file children, in bytes.
    #[serde(default)]
    pub size_bytes: u64,
}

/// Direct child counts of a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCounts {
    /// Number of direct file children.
    pub files: u64,
    /// Number of direct folder children.
    pub folders: u64,
    /// Number of direct children flagged as trashed.
    pub trashed: u64,
}

/// File-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    /// MIME type of the file content, if known.
    pub mime_type: Option<String>,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Lowercased file extension derived from the name, if any.
    pub extension: Option<String>,
    /// Version history, newest last.
    #[serde(default)]
    pub versions: Vec<FileVersion>,
}

/// A recorded version of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileVersion {
    /// Version number, starting at 1.
    pub version: u32,
    /// Size of this version in bytes.
    pub size_bytes: u64,
    /// When this version was recorded.
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a new folder node with zeroed counts and size.
    pub fn new_folder(name: impl Into<String>, parent_id: Option<NodeId>, path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::new(),
            parent_id,
            name: name.into(),
            path: path.into(),
            trashed: false,
            starred: false,
            tags: Vec::new(),
            metadata: None,
            created_at: now,
            modified_at: now,
            last_accessed_at: now,
            kind: NodeKind::Folder(FolderData::default()),
        }
    }

    /// Create a new file node. The extension is derived from the name and
    /// an initial version entry is recorded.
    pub fn new_file(
        name: impl Into<String>,
        parent_id: NodeId,
        path: impl Into<String>,
        size_bytes: u64,
        mime_type: Option<String>,
    ) -> Self {
        let name = name.into();
        let now = Utc::now();
        let extension = extension_of(&name);
        Self {
            id: NodeId::new(),
            parent_id: Some(parent_id),
            name,
            path: path.into(),
            trashed: false,
            starred: false,
            tags: Vec::new(),
            metadata: None,
            created_at: now,
            modified_at: now,
            last_accessed_at: now,
            kind: NodeKind::File(FileData {
                mime_type,
                size_bytes,
                extension,
                versions: vec![FileVersion {
                    version: 1,
                    size_bytes,
                    created_at: now,
                }],
            }),
        }
    }

    /// Check if this is the root node (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder(_))
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    /// The folder payload, if this node is a folder.
    pub fn folder_data(&self) -> Option<&FolderData> {
        match &self.kind {
            NodeKind::Folder(data) => Some(data),
            NodeKind::File(_) => None,
        }
    }

    /// Mutable folder payload, if this node is a folder.
    pub fn folder_data_mut(&mut self) -> Option<&mut FolderData> {
        match &mut self.kind {
            NodeKind::Folder(data) => Some(data),
            NodeKind::File(_) => None,
        }
    }

    /// The file payload, if this node is a file.
    pub fn file_data(&self) -> Option<&FileData> {
        match &self.kind {
            NodeKind::Folder(_) => None,
            NodeKind::File(data) => Some(data),
        }
    }

    /// Size in bytes: file size for files, aggregate size for folders.
    pub fn size_bytes(&self) -> u64 {
        match &self.kind {
            NodeKind::Folder(data) => data.size_bytes,
            NodeKind::File(data) => data.size_bytes,
        }
    }
}

/// Derive the lowercased extension from a file name, if any.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit('.')
        .next()
        .filter(|ext| *ext != name && !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_derivation() {
        assert_eq!(extension_of("report.PDF"), Some("pdf".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_new_file_records_initial_version() {
        let parent = NodeId::new();
        let file = Node::new_file("a.txt", parent, "/a.txt", 42, Some("text/plain".into()));
        let data = file.file_data().expect("file payload");
        assert_eq!(data.versions.len(), 1);
        assert_eq!(data.versions[0].version, 1);
        assert_eq!(data.versions[0].size_bytes, 42);
        assert_eq!(data.extension.as_deref(), Some("txt"));
        assert!(!file.is_root());
    }

    #[test]
    fn test_folder_starts_empty() {
        let folder = Node::new_folder("docs", None, "/docs");
        let data = folder.folder_data().expect("folder payload");
        assert_eq!(data.counts, ChildCounts::default());
        assert_eq!(data.size_bytes, 0);
        assert!(folder.is_folder());
        assert!(!folder.is_file());
    }

    #[test]
    fn test_serde_tagged_roundtrip() {
        let folder = Node::new_folder("docs", None, "/docs");
        let json = serde_json::to_value(&folder).expect("serialize");
        assert_eq!(json["type"], "folder");
        let parsed: Node = serde_json::from_value(json).expect("deserialize");
        assert!(parsed.is_folder());
        assert_eq!(parsed.id, folder.id);
    }
}
