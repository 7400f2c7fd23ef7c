//! Raw drop input.

use serde::{Deserialize, Serialize};

/// One browser-level file entry extracted from a drop or picker event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedFile {
    /// Bare file name.
    pub name: String,
    /// Best-effort relative path within the dropped directory tree.
    /// Plain file selection has none and falls back to the bare name.
    pub relative_path: Option<String>,
    /// Reported size in bytes.
    pub size_bytes: u64,
    /// Reported MIME type, if any.
    pub mime_type: Option<String>,
}

impl DroppedFile {
    /// A plain file entry with no directory provenance.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            relative_path: None,
            size_bytes,
            mime_type: None,
        }
    }

    /// Attach a relative path (directory-drop provenance).
    pub fn with_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    /// Attach a MIME type.
    pub fn with_mime(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// The path used for classification: the relative path when present,
    /// otherwise the bare name.
    pub fn effective_path(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }
}

/// How a whole drop batch is treated. Decided once per batch, not per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSource {
    /// Plain files attached directly to the current folder.
    Flat,
    /// A directory drop: relative paths imply a folder chain.
    FolderSourced,
}
