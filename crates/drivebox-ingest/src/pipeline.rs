//! The upload ingestion pipeline.
//!
//! One drop batch at a time moves through
//! `Idle -> Draining -> Classifying -> Chunking -> Committing -> Idle`
//! (failures detour through `Failed` before returning to `Idle`). Chunk
//! boundaries yield back to the scheduler so a large drop cannot starve
//! the host's event loop; the yields carry no ordering semantics beyond
//! strict in-order chunk processing. All new nodes are buffered and
//! committed as one atomic batch insert with a single snapshot persist.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use drivebox_core::config::ingest::IngestConfig;
use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::Node;
use drivebox_service::DriveService;
use drivebox_service::naming::validate_name;
use drivebox_store::PathResolver;

use crate::classify::{classify_batch, strip_upload_artifact};
use crate::progress::{ProgressFn, ProgressReporter};
use crate::source::{BatchSource, DroppedFile};

/// Pipeline lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Ready for a new drop.
    Idle = 0,
    /// Extracting file entries and byte totals.
    Draining = 1,
    /// Deciding flat versus folder-sourced.
    Classifying = 2,
    /// Converting files to nodes, one chunk at a time.
    Chunking = 3,
    /// Handing the buffered batch to the store.
    Committing = 4,
    /// A batch failed; transient, immediately followed by `Idle`.
    Failed = 5,
}

impl PipelineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Draining,
            2 => Self::Classifying,
            3 => Self::Chunking,
            4 => Self::Committing,
            5 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Atomic state cell; the busy guard is a compare-and-swap on `Idle`.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(PipelineState::Idle as u8))
    }

    fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: PipelineState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Draining as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// The result of a successfully ingested batch.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Every node the batch created (folders and files).
    pub created: Vec<Node>,
    /// How the batch was classified.
    pub source: BatchSource,
}

/// Converts drop input into tree mutations, one batch at a time.
#[derive(Debug)]
pub struct IngestPipeline {
    /// The mutation service owning the store.
    service: Arc<Mutex<DriveService>>,
    /// Chunking and debounce settings.
    config: IngestConfig,
    /// Lifecycle state and busy guard.
    state: StateCell,
    /// Debounced progress reporting.
    reporter: ProgressReporter,
}

impl IngestPipeline {
    /// Create a pipeline over the given service.
    pub fn new(
        service: Arc<Mutex<DriveService>>,
        config: IngestConfig,
        on_progress: ProgressFn,
    ) -> Self {
        let reporter = ProgressReporter::new(
            on_progress,
            Duration::from_millis(config.progress_debounce_ms),
        );
        Self {
            service,
            config,
            state: StateCell::new(),
            reporter,
        }
    }

    /// The shared mutation service.
    pub fn service(&self) -> Arc<Mutex<DriveService>> {
        self.service.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// Ingest a plain file selection (no directory provenance).
    pub async fn ingest_files(&self, files: Vec<DroppedFile>) -> AppResult<IngestOutcome> {
        self.run(files).await
    }

    /// Ingest a directory drop: one relative path per file entry.
    pub async fn ingest_folder(
        &self,
        files: Vec<DroppedFile>,
        relative_paths: Vec<String>,
    ) -> AppResult<IngestOutcome> {
        if files.len() != relative_paths.len() {
            return Err(AppError::ingestion(format!(
                "Path count mismatch: {} files, {} paths",
                files.len(),
                relative_paths.len()
            )));
        }
        let files = files
            .into_iter()
            .zip(relative_paths)
            .map(|(file, path)| file.with_path(path))
            .collect();
        self.run(files).await
    }

    /// Process one batch end to end. A drop arriving while another batch
    /// is in flight is rejected outright, never queued.
    async fn run(&self, files: Vec<DroppedFile>) -> AppResult<IngestOutcome> {
        if !self.state.try_begin() {
            warn!(
                state = ?self.state.get(),
                "Drop rejected: a batch is already in flight"
            );
            return Err(AppError::busy("An upload batch is already being processed"));
        }

        let total: u64 = files.iter().map(|f| f.size_bytes).sum();
        let result = self.execute(files, total).await;
        match &result {
            Ok(outcome) => {
                self.reporter.flush(total, total).await;
                info!(
                    created = outcome.created.len(),
                    source = ?outcome.source,
                    bytes = total,
                    "Batch ingested"
                );
                self.state.set(PipelineState::Idle);
            }
            Err(e) => {
                warn!(error = %e, "Batch ingestion failed");
                self.state.set(PipelineState::Failed);
                self.reporter.flush(0, total).await;
                self.state.set(PipelineState::Idle);
            }
        }
        result
    }

    async fn execute(&self, files: Vec<DroppedFile>, total: u64) -> AppResult<IngestOutcome> {
        // Draining: entries are already extracted; bound the batch and
        // report the forced start event.
        if files.len() > self.config.max_batch_files {
            return Err(AppError::ingestion(format!(
                "Batch of {} files exceeds the limit of {}",
                files.len(),
                self.config.max_batch_files
            )));
        }
        self.reporter.flush(0, total).await;

        self.state.set(PipelineState::Classifying);
        let source = classify_batch(&files);

        self.state.set(PipelineState::Chunking);
        // The service lock spans the whole batch: conflict checks and the
        // memoized folder chains are computed against one consistent tree
        // state, and the commit sees exactly that state. Chunk-boundary
        // yields hand the scheduler to tasks that do not touch the store.
        let mut svc = self.service.lock().await;
        let current = svc.current_folder_id();
        let current_path = svc
            .node(current)
            .map(|n| n.path.clone())
            .ok_or_else(|| AppError::internal("Current folder disappeared"))?;

        let mut created: Vec<Node> = Vec::new();
        // Folder chains are memoized by relative directory path so shared
        // prefixes are created once per batch.
        let mut chain_memo: HashMap<String, (NodeId, String)> = HashMap::new();
        let mut names_taken: HashMap<NodeId, HashSet<String>> = HashMap::new();
        let mut loaded = 0u64;

        let chunk_size = self.config.chunk_size.max(1);
        for chunk in files.chunks(chunk_size) {
            for file in chunk {
                let name = validate_name(&file.name)?;

                let (parent, parent_path) = if source == BatchSource::FolderSourced {
                    let stripped = strip_upload_artifact(file.effective_path());
                    let segments: Vec<&str> =
                        stripped.split('/').filter(|s| !s.is_empty()).collect();
                    let dirs = &segments[..segments.len().saturating_sub(1)];
                    ensure_folder_chain(
                        &svc,
                        &mut created,
                        &mut chain_memo,
                        &mut names_taken,
                        current,
                        &current_path,
                        dirs,
                    )?
                } else {
                    (current, current_path.clone())
                };

                claim_file_name(&svc, &mut names_taken, parent, &name)?;
                created.push(Node::new_file(
                    &name,
                    parent,
                    join_path(&parent_path, &name),
                    file.size_bytes,
                    file.mime_type.clone(),
                ));
                loaded += file.size_bytes;
            }

            self.reporter.update(loaded, total, false).await;
            // Hand control back to the scheduler between chunks.
            tokio::task::yield_now().await;
        }

        self.state.set(PipelineState::Committing);
        let created = svc.insert_batch(created)?;
        Ok(IngestOutcome { created, source })
    }
}

/// Walk (and create where missing) the folder chain for one file's
/// directory segments, rooted at the current folder. Existing folders are
/// reused case-insensitively; chains created by this batch are memoized.
fn ensure_folder_chain(
    svc: &DriveService,
    created: &mut Vec<Node>,
    chain_memo: &mut HashMap<String, (NodeId, String)>,
    names_taken: &mut HashMap<NodeId, HashSet<String>>,
    base: NodeId,
    base_path: &str,
    dirs: &[&str],
) -> AppResult<(NodeId, String)> {
    let mut parent = base;
    let mut parent_path = base_path.to_string();
    let mut key = String::new();

    for segment in dirs {
        let name = validate_name(segment)?;
        key.push('/');
        key.push_str(&name.to_lowercase());

        if let Some((id, path)) = chain_memo.get(&key) {
            parent = *id;
            parent_path = path.clone();
            continue;
        }

        let existing = PathResolver::new(svc.store()).child_by_name(parent, &name);
        match existing {
            Some(node) if node.is_folder() => {
                chain_memo.insert(key.clone(), (node.id, node.path.clone()));
                parent = node.id;
                parent_path = node.path.clone();
            }
            Some(_) => {
                return Err(AppError::name_conflict(format!(
                    "A file named '{name}' blocks the folder chain"
                )));
            }
            None => {
                if names_taken
                    .get(&parent)
                    .is_some_and(|taken| taken.contains(&name.to_lowercase()))
                {
                    return Err(AppError::name_conflict(format!(
                        "'{name}' was already claimed by this batch"
                    )));
                }
                let folder = Node::new_folder(&name, Some(parent), join_path(&parent_path, &name));
                chain_memo.insert(key.clone(), (folder.id, folder.path.clone()));
                names_taken
                    .entry(parent)
                    .or_default()
                    .insert(name.to_lowercase());
                parent = folder.id;
                parent_path = folder.path.clone();
                created.push(folder);
            }
        }
    }

    Ok((parent, parent_path))
}

/// Claim a file name under a parent: rejected if an existing sibling or an
/// earlier entry of this batch already holds it (case-insensitive).
fn claim_file_name(
    svc: &DriveService,
    names_taken: &mut HashMap<NodeId, HashSet<String>>,
    parent: NodeId,
    name: &str,
) -> AppResult<()> {
    if PathResolver::new(svc.store())
        .child_by_name(parent, name)
        .is_some()
    {
        return Err(AppError::name_conflict(format!(
            "An item named '{name}' already exists here"
        )));
    }
    if !names_taken
        .entry(parent)
        .or_default()
        .insert(name.to_lowercase())
    {
        return Err(AppError::name_conflict(format!(
            "The batch contains '{name}' more than once"
        )));
    }
    Ok(())
}

/// Concatenate a parent path and a child name (`/` contributes an empty
/// prefix).
fn join_path(parent_path: &str, name: &str) -> String {
    if parent_path == "/" {
        format!("/{name}")
    } else {
        format!("{parent_path}/{name}")
    }
}
