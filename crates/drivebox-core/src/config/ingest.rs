//! Upload ingestion pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the upload ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of files processed per chunk before yielding to the scheduler.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Quiet period for debounced progress reports, in milliseconds.
    #[serde(default = "default_progress_debounce_ms")]
    pub progress_debounce_ms: u64,
    /// Maximum number of files accepted in a single drop.
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            progress_debounce_ms: default_progress_debounce_ms(),
            max_batch_files: default_max_batch_files(),
        }
    }
}

fn default_chunk_size() -> usize {
    50
}

fn default_progress_debounce_ms() -> u64 {
    100
}

fn default_max_batch_files() -> usize {
    10_000
}
