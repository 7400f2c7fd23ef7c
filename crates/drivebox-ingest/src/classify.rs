//! Batch classification: flat files versus a folder drop.

use crate::source::{BatchSource, DroppedFile};

/// Strip a single leading `./`, an upload-tool artifact that must not by
/// itself count as directory provenance.
pub fn strip_upload_artifact(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Whether a path carries a non-empty directory segment besides the final
/// file name.
pub fn has_directory_segment(path: &str) -> bool {
    let stripped = strip_upload_artifact(path);
    let mut segments = stripped.split('/').rev();
    segments.next(); // the file name itself
    segments.any(|segment| !segment.is_empty())
}

/// Classify a whole drop batch. One boolean decided once per batch: if
/// **any** entry carries a directory segment, the batch is folder-sourced.
pub fn classify_batch(files: &[DroppedFile]) -> BatchSource {
    if files
        .iter()
        .any(|file| has_directory_segment(file.effective_path()))
    {
        BatchSource::FolderSourced
    } else {
        BatchSource::Flat
    }
}
