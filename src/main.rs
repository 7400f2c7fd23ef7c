//! Drivebox virtual drive CLI.
//!
//! Binds the store, mutation service, and ingestion pipeline together
//! behind a small command-line surface. State lives in a JSON snapshot
//! on disk; every command loads it, applies its mutation, and exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

use drivebox_core::config::AppConfig;
use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;
use drivebox_entity::{Node, NodeView};
use drivebox_ingest::{DroppedFile, IngestPipeline, ProgressFn};
use drivebox_service::DriveService;
use drivebox_store::JsonSnapshotStore;

#[derive(Parser)]
#[command(name = "drivebox", about = "A virtual hierarchical drive", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tree rooted at a path (default `/`).
    Tree { path: Option<String> },
    /// List the direct children of a folder (default `/`).
    Ls { path: Option<String> },
    /// Create a folder at the given path.
    Mkdir { path: String },
    /// Rename the item at a path.
    Rename { path: String, new_name: String },
    /// Move an item into another folder.
    Mv { path: String, dest: String },
    /// Remove an item and its whole subtree.
    Rm { path: String },
    /// Import a local directory as a folder-sourced upload batch.
    Import { dir: PathBuf },
}

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, Cli::parse()).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("DRIVEBOX_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(false).init();
        }
    }
}

async fn run(config: AppConfig, cli: Cli) -> AppResult<()> {
    let snapshots = JsonSnapshotStore::new(&config.store.snapshot_path)?;
    let mut service = DriveService::open(Arc::new(snapshots))?;

    match cli.command {
        Command::Tree { path } => {
            let node = resolve(&service, path.as_deref().unwrap_or("/"))?;
            print_tree(&service.node_view(node.id)?, 0);
        }
        Command::Ls { path } => {
            let node = resolve(&service, path.as_deref().unwrap_or("/"))?;
            let view = service.node_view(node.id)?;
            for child in &view.children {
                println!("{}", format_entry(child));
            }
        }
        Command::Mkdir { path } => {
            let (parent_path, name) = split_parent(&path);
            let parent = resolve(&service, parent_path)?;
            let folder = service.create_folder(name, parent.id)?;
            println!("{}", folder.path);
        }
        Command::Rename { path, new_name } => {
            let node = resolve(&service, &path)?;
            let renamed = service.rename_item(node.id, &new_name)?;
            println!("{}", renamed.path);
        }
        Command::Mv { path, dest } => {
            let node = resolve(&service, &path)?;
            let target = resolve(&service, &dest)?;
            let moved = service.move_item(node.id, target.id)?;
            println!("{}", moved.path);
        }
        Command::Rm { path } => {
            let node = resolve(&service, &path)?;
            let removed = service.remove_item(node.id)?;
            println!("removed {} item(s)", removed.removed.len());
        }
        Command::Import { dir } => {
            let (files, paths) = collect_directory(&dir)?;
            if files.is_empty() {
                println!("nothing to import");
                return Ok(());
            }

            let on_progress: ProgressFn = Arc::new(|loaded, total| {
                tracing::info!(loaded, total, "Import progress");
            });
            let pipeline = IngestPipeline::new(
                Arc::new(Mutex::new(service)),
                config.ingest.clone(),
                on_progress,
            );
            let outcome = pipeline.ingest_folder(files, paths).await?;
            println!("imported {} item(s)", outcome.created.len());
        }
    }

    Ok(())
}

fn resolve(service: &DriveService, path: &str) -> AppResult<Node> {
    service
        .resolve_path(path)
        .ok_or_else(|| AppError::not_found(format!("No item at '{path}'")))
}

/// Split `/a/b/c` into the parent path `/a/b` and the leaf name `c`.
fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("/", trimmed),
    }
}

/// Recursively collect a local directory into drop entries with paths
/// relative to the directory itself.
fn collect_directory(dir: &Path) -> AppResult<(Vec<DroppedFile>, Vec<String>)> {
    let mut files = Vec::new();
    let mut paths = Vec::new();
    walk_directory(dir, "", &mut files, &mut paths)?;
    Ok((files, paths))
}

fn walk_directory(
    dir: &Path,
    prefix: &str,
    files: &mut Vec<DroppedFile>,
    paths: &mut Vec<String>,
) -> AppResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_directory(&entry.path(), &relative, files, paths)?;
        } else if file_type.is_file() {
            let size = entry.metadata()?.len();
            files.push(DroppedFile::new(name, size));
            paths.push(relative);
        }
    }
    Ok(())
}

fn format_entry(view: &NodeView) -> String {
    if view.is_folder {
        format!("{}/", view.name)
    } else {
        format!("{} ({} bytes)", view.name, view.size_bytes)
    }
}

fn print_tree(view: &NodeView, depth: usize) {
    println!("{}{}", "  ".repeat(depth), format_entry(view));
    for child in &view.children {
        print_tree(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::split_parent;

    #[test]
    fn test_split_parent() {
        assert_eq!(split_parent("/a/b/c"), ("/a/b", "c"));
        assert_eq!(split_parent("/a"), ("/", "a"));
        assert_eq!(split_parent("a"), ("/", "a"));
        assert_eq!(split_parent("/a/b/"), ("/a", "b"));
    }
}
