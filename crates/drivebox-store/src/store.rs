//! The authoritative in-memory node arena.
//!
//! [`FileSystemStore`] owns every node in a flat map keyed by [`NodeId`]
//! plus the current-folder cursor. It is a deliberately dumb primitive:
//! inserts are unvalidated and callers (the mutation service) are
//! responsible for upholding the tree invariants. After every committed
//! mutation the full map is handed to the snapshot collaborator; save
//! failures are logged and swallowed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;
use drivebox_core::types::NodeId;
use drivebox_entity::{Node, NodePatch};

use crate::persist::SnapshotStore;

/// The result of a cascading remove.
#[derive(Debug, Clone)]
pub struct RemovedSubtree {
    /// Every removed node id, subtree root included.
    pub removed: Vec<NodeId>,
    /// Where the cursor moved, if it pointed inside the removed subtree.
    pub cursor_relocated_to: Option<NodeId>,
}

/// In-memory tree of folder and file nodes keyed by identifier.
#[derive(Debug)]
pub struct FileSystemStore {
    /// All nodes, the single arena owning the tree.
    nodes: HashMap<NodeId, Node>,
    /// The unique parentless folder.
    root_id: NodeId,
    /// The folder currently being browsed.
    current_folder_id: NodeId,
    /// Durable snapshot collaborator.
    snapshots: Arc<dyn SnapshotStore>,
}

impl FileSystemStore {
    /// Open a store from the snapshot collaborator.
    ///
    /// A non-empty snapshot must contain exactly one parentless folder
    /// node (the root); anything else fails with a persistence error. A
    /// missing or empty snapshot seeds a fresh root folder at `/`.
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> AppResult<Self> {
        match snapshots.load()? {
            Some(nodes) if !nodes.is_empty() => {
                let mut roots = nodes.values().filter(|n| n.is_root());
                let root = roots
                    .next()
                    .ok_or_else(|| AppError::persistence("Snapshot contains no root node"))?;
                if !root.is_folder() {
                    return Err(AppError::persistence("Snapshot root is not a folder"));
                }
                if roots.next().is_some() {
                    return Err(AppError::persistence("Snapshot contains multiple root nodes"));
                }
                let root_id = root.id;
                debug!(nodes = nodes.len(), %root_id, "Opened store from snapshot");
                Ok(Self {
                    nodes,
                    root_id,
                    current_folder_id: root_id,
                    snapshots,
                })
            }
            _ => {
                let root = Node::new_folder("Home", None, "/");
                let root_id = root.id;
                let mut nodes = HashMap::new();
                nodes.insert(root_id, root);
                let store = Self {
                    nodes,
                    root_id,
                    current_folder_id: root_id,
                    snapshots,
                };
                store.persist();
                debug!(%root_id, "Seeded fresh store");
                Ok(store)
            }
        }
    }

    /// The id of the root folder.
    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// The id of the folder currently being browsed.
    pub fn current_folder_id(&self) -> NodeId {
        self.current_folder_id
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether a node with the given id exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes. Never true for an opened store.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Insert a fully-formed, already-validated node.
    ///
    /// No invariant checks happen here; the mutation service validates
    /// before calling. Triggers a snapshot persist.
    pub fn add_item(&mut self, node: Node) {
        debug!(id = %node.id, path = %node.path, "Node added");
        self.nodes.insert(node.id, node);
        self.persist();
    }

    /// Insert a batch of already-validated nodes with a single snapshot
    /// persist at the end. Callers never observe a partial commit.
    pub fn add_items(&mut self, batch: Vec<Node>) {
        let count = batch.len();
        for node in batch {
            self.nodes.insert(node.id, node);
        }
        debug!(count, "Node batch added");
        self.persist();
    }

    /// Merge a partial update into an existing node, stamping
    /// `modified_at`. Unknown ids signal [`drivebox_core::error::ErrorKind::NotFound`].
    pub fn update_item(&mut self, id: NodeId, patch: NodePatch) -> AppResult<Node> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Node not found: {id}")))?;

        if let Some(name) = patch.name {
            node.name = name;
        }
        if let Some(parent_id) = patch.parent_id {
            node.parent_id = Some(parent_id);
        }
        if let Some(path) = patch.path {
            node.path = path;
        }
        if let Some(trashed) = patch.trashed {
            node.trashed = trashed;
        }
        if let Some(starred) = patch.starred {
            node.starred = starred;
        }
        if let Some(tags) = patch.tags {
            node.tags = tags;
        }
        if let Some(metadata) = patch.metadata {
            node.metadata = Some(metadata);
        }
        if let Some(at) = patch.last_accessed_at {
            node.last_accessed_at = at;
        }
        node.modified_at = Utc::now();

        let updated = node.clone();
        self.persist();
        Ok(updated)
    }

    /// Remove a node and every descendant reachable through `parent_id`
    /// back-references, atomically.
    ///
    /// If the cursor pointed inside the removed subtree it relocates to
    /// the removed root's former parent, or to the root if that parent is
    /// gone too. Removing the root itself is rejected.
    pub fn remove_item(&mut self, id: NodeId) -> AppResult<RemovedSubtree> {
        if !self.nodes.contains_key(&id) {
            return Err(AppError::not_found(format!("Node not found: {id}")));
        }
        if id == self.root_id {
            return Err(AppError::validation("The root folder cannot be removed"));
        }

        let former_parent = self.nodes[&id].parent_id;

        // One pass to index children, then a breadth-first walk.
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node.id);
            }
        }

        let mut removed = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            removed.push(current);
            if let Some(kids) = children.get(&current) {
                queue.extend(kids.iter().copied());
            }
        }

        for victim in &removed {
            self.nodes.remove(victim);
        }

        let cursor_relocated_to = if removed.contains(&self.current_folder_id) {
            let target = match former_parent {
                Some(parent) if self.nodes.contains_key(&parent) => parent,
                _ => self.root_id,
            };
            self.current_folder_id = target;
            Some(target)
        } else {
            None
        };

        debug!(subtree_root = %id, removed = removed.len(), "Subtree removed");
        self.persist();
        Ok(RemovedSubtree {
            removed,
            cursor_relocated_to,
        })
    }

    /// Point the cursor at a folder. Accepted only for the root or an
    /// existing folder node; stamps the target's `last_accessed_at`.
    pub fn set_current_folder(&mut self, id: NodeId) -> AppResult<()> {
        let is_folder = self.nodes.get(&id).is_some_and(Node::is_folder);
        if id != self.root_id && !is_folder {
            return Err(AppError::not_a_folder(format!(
                "Cannot navigate to {id}: not an existing folder"
            )));
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.last_accessed_at = Utc::now();
        }
        self.current_folder_id = id;
        self.persist();
        Ok(())
    }

    /// Direct mutable access for the mutation service's derived-state
    /// refresh (folder stats). Not part of the public operation contract.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Persist the node map after derived-state maintenance performed
    /// through [`FileSystemStore::get_mut`].
    pub fn persist_now(&self) {
        self.persist();
    }

    /// Hand the current map to the snapshot collaborator, fire-and-forget.
    fn persist(&self) {
        if let Err(e) = self.snapshots.save(&self.nodes) {
            warn!(error = %e, "Snapshot persist failed");
        }
    }
}
