//! Validated tree mutations.
//!
//! [`DriveService`] owns the [`FileSystemStore`] and is the only writer.
//! Each operation validates fully before touching the store, so a rejected
//! operation is never partially applied. Cached `path` fields are kept in
//! lockstep with the `parent_id` chain: rename and move rewrite the moved
//! node's own path and cascade the rewrite to every descendant.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::{Breadcrumb, Node, NodePatch, NodeView};
use drivebox_store::persist::SnapshotStore;
use drivebox_store::{FileSystemStore, PathResolver, RemovedSubtree};

use crate::naming::validate_name;

/// Validated mutation operations over the virtual file tree.
#[derive(Debug)]
pub struct DriveService {
    /// The node arena. Mutated only through this service.
    store: FileSystemStore,
}

impl DriveService {
    /// Wrap an already-opened store.
    pub fn new(store: FileSystemStore) -> Self {
        Self { store }
    }

    /// Open a store from the snapshot collaborator and wrap it.
    pub fn open(snapshots: Arc<dyn SnapshotStore>) -> AppResult<Self> {
        Ok(Self::new(FileSystemStore::new(snapshots)?))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &FileSystemStore {
        &self.store
    }

    /// The root folder id.
    pub fn root_id(&self) -> NodeId {
        self.store.root_id()
    }

    /// The cursor: the folder currently being browsed.
    pub fn current_folder_id(&self) -> NodeId {
        self.store.current_folder_id()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    /// Create a new, empty folder under `parent_id`.
    pub fn create_folder(&mut self, name: &str, parent_id: NodeId) -> AppResult<Node> {
        let name = validate_name(name)?;
        let parent_path = self.require_folder(parent_id)?.path.clone();
        self.ensure_no_sibling_conflict(parent_id, &name, None)?;

        let folder = Node::new_folder(&name, Some(parent_id), child_path(&parent_path, &name));
        let created = folder.clone();
        self.store.add_item(folder);
        self.refresh_folder_stats(parent_id);

        info!(
            folder_id = %created.id,
            path = %created.path,
            "Folder created"
        );
        Ok(created)
    }

    /// Rename a node. Renaming to the current name is an idempotent no-op
    /// that does not stamp `modified_at`.
    pub fn rename_item(&mut self, item_id: NodeId, new_name: &str) -> AppResult<Node> {
        let node = self
            .store
            .get(item_id)
            .ok_or_else(|| AppError::not_found(format!("Node not found: {item_id}")))?;

        let name = validate_name(new_name)?;
        if node.name == name {
            return Ok(node.clone());
        }

        let parent_id = node.parent_id;
        let old_path = node.path.clone();

        let new_path = match parent_id {
            // The root's path is always "/", whatever it is called.
            None => "/".to_string(),
            Some(parent_id) => {
                self.ensure_no_sibling_conflict(parent_id, &name, Some(item_id))?;
                let parent_path = self.require_folder(parent_id)?.path.clone();
                child_path(&parent_path, &name)
            }
        };

        let updated = self
            .store
            .update_item(item_id, NodePatch::rename(&name, &new_path))?;
        self.cascade_descendant_paths(item_id);

        info!(
            item_id = %item_id,
            old_path = %old_path,
            new_path = %updated.path,
            "Node renamed"
        );
        Ok(updated)
    }

    /// Move a node under a new parent folder. Moving to the current parent
    /// is an idempotent no-op that does not stamp `modified_at`.
    pub fn move_item(&mut self, item_id: NodeId, new_parent_id: NodeId) -> AppResult<Node> {
        let node = self
            .store
            .get(item_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Node not found: {item_id}")))?;
        let old_parent = node.parent_id;
        let old_path = node.path.clone();

        let target_path = self.require_folder(new_parent_id)?.path.clone();
        if new_parent_id == item_id {
            return Err(AppError::cyclic_move("Cannot move a node into itself"));
        }
        if PathResolver::new(&self.store).is_descendant(new_parent_id, item_id) {
            return Err(AppError::cyclic_move(
                "Cannot move a node into one of its own descendants",
            ));
        }
        if old_parent == Some(new_parent_id) {
            return Ok(node);
        }
        self.ensure_no_sibling_conflict(new_parent_id, &node.name, Some(item_id))?;

        let new_path = child_path(&target_path, &node.name);
        let updated = self
            .store
            .update_item(item_id, NodePatch::reparent(new_parent_id, &new_path))?;
        self.cascade_descendant_paths(item_id);

        if let Some(old_parent) = old_parent {
            self.refresh_folder_stats(old_parent);
        }
        self.refresh_folder_stats(new_parent_id);

        info!(
            item_id = %item_id,
            old_path = %old_path,
            new_path = %updated.path,
            "Node moved"
        );
        Ok(updated)
    }

    /// Remove a node together with all of its descendants.
    pub fn remove_item(&mut self, item_id: NodeId) -> AppResult<RemovedSubtree> {
        let former_parent = self
            .store
            .get(item_id)
            .ok_or_else(|| AppError::not_found(format!("Node not found: {item_id}")))?
            .parent_id;

        let outcome = self.store.remove_item(item_id)?;
        if let Some(parent) = former_parent
            && self.store.contains(parent)
        {
            self.refresh_folder_stats(parent);
        }

        info!(
            item_id = %item_id,
            removed = outcome.removed.len(),
            "Subtree removed"
        );
        Ok(outcome)
    }

    /// Insert a pre-validated batch of nodes as one atomic commit with a
    /// single snapshot persist. Used by the ingestion pipeline.
    pub fn insert_batch(&mut self, batch: Vec<Node>) -> AppResult<Vec<Node>> {
        let touched_parents: HashSet<NodeId> =
            batch.iter().filter_map(|node| node.parent_id).collect();
        let created = batch.clone();
        self.store.add_items(batch);
        for parent in touched_parents {
            if self.store.get(parent).is_some_and(Node::is_folder) {
                self.refresh_folder_stats(parent);
            }
        }

        info!(count = created.len(), "Batch inserted");
        Ok(created)
    }

    /// Point the cursor at a folder.
    pub fn set_current_folder(&mut self, id: NodeId) -> AppResult<()> {
        self.store.set_current_folder(id)
    }

    /// Breadcrumb chain for a node, root first.
    pub fn breadcrumbs(&self, id: NodeId) -> Vec<Breadcrumb> {
        PathResolver::new(&self.store).breadcrumbs(id)
    }

    /// Snapshot of a folder's direct children.
    pub fn children(&self, id: NodeId) -> Vec<Node> {
        PathResolver::new(&self.store)
            .children_of(id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve a `/`-separated path to a node snapshot.
    pub fn resolve_path(&self, path: &str) -> Option<Node> {
        PathResolver::new(&self.store).resolve_path(path).cloned()
    }

    /// Build the display tree rooted at `id`, folders before files,
    /// both name-sorted.
    pub fn node_view(&self, id: NodeId) -> AppResult<NodeView> {
        let node = self
            .store
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("Node not found: {id}")))?;
        Ok(self.build_view(node))
    }

    fn build_view(&self, node: &Node) -> NodeView {
        let resolver = PathResolver::new(&self.store);
        let mut children: Vec<&Node> = if node.is_folder() {
            resolver.children_of(node.id)
        } else {
            Vec::new()
        };
        children.sort_by(|a, b| {
            (a.is_file(), a.name.to_lowercase()).cmp(&(b.is_file(), b.name.to_lowercase()))
        });

        NodeView {
            id: node.id,
            name: node.name.clone(),
            path: node.path.clone(),
            is_folder: node.is_folder(),
            size_bytes: node.size_bytes(),
            children: children
                .into_iter()
                .map(|child| self.build_view(child))
                .collect(),
        }
    }

    /// The parent must exist and be a folder.
    fn require_folder(&self, id: NodeId) -> AppResult<&Node> {
        match self.store.get(id) {
            Some(node) if node.is_folder() => Ok(node),
            Some(_) => Err(AppError::not_a_folder(format!("{id} is not a folder"))),
            None => Err(AppError::not_a_folder(format!("Folder not found: {id}"))),
        }
    }

    /// Reject a case-insensitive sibling name collision under `parent_id`,
    /// optionally ignoring one node (the one being renamed/moved).
    fn ensure_no_sibling_conflict(
        &self,
        parent_id: NodeId,
        name: &str,
        exclude: Option<NodeId>,
    ) -> AppResult<()> {
        let existing = PathResolver::new(&self.store).child_by_name(parent_id, name);
        match existing {
            Some(node) if Some(node.id) != exclude => Err(AppError::name_conflict(format!(
                "An item named '{name}' already exists here"
            ))),
            _ => Ok(()),
        }
    }

    /// Rewrite every descendant's cached path from its parent's current
    /// path. Descendants are not "modified" by an ancestor rename, so this
    /// writes paths directly without stamping `modified_at`, then persists
    /// once.
    fn cascade_descendant_paths(&mut self, subtree_root: NodeId) {
        let mut queue = vec![subtree_root];
        let mut touched = false;
        while let Some(parent_id) = queue.pop() {
            let Some(parent) = self.store.get(parent_id) else {
                continue;
            };
            let parent_path = parent.path.clone();
            let child_ids: Vec<NodeId> = PathResolver::new(&self.store)
                .children_of(parent_id)
                .iter()
                .map(|n| n.id)
                .collect();
            for child_id in child_ids {
                if let Some(child) = self.store.get_mut(child_id) {
                    child.path = child_path(&parent_path, &child.name);
                    touched = true;
                    if child.is_folder() {
                        queue.push(child_id);
                    }
                }
            }
        }
        if touched {
            self.store.persist_now();
        }
    }

    /// Recompute a folder's direct child counts and aggregate size from
    /// the arena. Always recomputed in full, never incremented.
    fn refresh_folder_stats(&mut self, folder_id: NodeId) {
        let resolver = PathResolver::new(&self.store);
        let mut files = 0u64;
        let mut folders = 0u64;
        let mut trashed = 0u64;
        let mut size_bytes = 0u64;
        for child in resolver.children_of(folder_id) {
            if child.trashed {
                trashed += 1;
            }
            if child.is_file() {
                files += 1;
                size_bytes += child.size_bytes();
            } else {
                folders += 1;
            }
        }

        if let Some(data) = self
            .store
            .get_mut(folder_id)
            .and_then(Node::folder_data_mut)
        {
            data.counts.files = files;
            data.counts.folders = folders;
            data.counts.trashed = trashed;
            data.size_bytes = size_bytes;
            self.store.persist_now();
        }
    }
}

/// Concatenate a parent path and a child name; the root parent
/// contributes an empty prefix so children of `/` come out as `/name`.
fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path == "/" {
        format!("/{name}")
    } else {
        format!("{parent_path}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path_handles_root_parent() {
        assert_eq!(child_path("/", "docs"), "/docs");
        assert_eq!(child_path("/docs", "a.txt"), "/docs/a.txt");
    }
}
