//! # drivebox-ingest
//!
//! The upload ingestion pipeline: converts heterogeneous drag-and-drop
//! input (flat files, or folder drops carrying relative paths) into a
//! minimal batch of tree mutations, processed in yield-bounded chunks
//! with debounced progress reporting.

pub mod classify;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use classify::{classify_batch, strip_upload_artifact};
pub use pipeline::{IngestOutcome, IngestPipeline, PipelineState};
pub use progress::{ProgressFn, ProgressReporter};
pub use source::{BatchSource, DroppedFile};
