//! Path resolution and breadcrumb derivation.
//!
//! [`PathResolver`] is a borrowing read projection over the store. It never
//! mutates and never fails: broken parent links degrade to best-effort
//! results instead of errors.

use drivebox_core::types::NodeId;
use drivebox_entity::{Breadcrumb, Node};

use crate::store::FileSystemStore;

/// Read-only projections derived from the `parent_id` chain.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    store: &'a FileSystemStore,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver over the given store.
    pub fn new(store: &'a FileSystemStore) -> Self {
        Self { store }
    }

    /// The breadcrumb chain from the root down to `id`, root first.
    ///
    /// Walks `parent_id` upward, bounded by the node count so a corrupt
    /// map can never loop forever. A broken link stops the walk; whatever
    /// was collected is returned with the root prepended when available.
    pub fn breadcrumbs(&self, id: NodeId) -> Vec<Breadcrumb> {
        let mut crumbs = Vec::new();
        let mut current = self.store.get(id);
        let mut steps = 0usize;

        while let Some(node) = current {
            crumbs.push(Breadcrumb::new(node.id, node.name.clone()));
            steps += 1;
            if steps > self.store.len() {
                break;
            }
            current = match node.parent_id {
                None => None,
                Some(parent_id) => self.store.get(parent_id),
            };
        }

        crumbs.reverse();

        let root_id = self.store.root_id();
        if crumbs.first().map(|c| c.id) != Some(root_id)
            && let Some(root) = self.store.get(root_id)
        {
            crumbs.insert(0, Breadcrumb::new(root.id, root.name.clone()));
        }
        crumbs
    }

    /// All direct children of `id` (no recursion).
    pub fn children_of(&self, id: NodeId) -> Vec<&'a Node> {
        self.store
            .iter()
            .filter(|node| node.parent_id == Some(id))
            .collect()
    }

    /// Case-insensitive direct-child lookup by name.
    pub fn child_by_name(&self, parent_id: NodeId, name: &str) -> Option<&'a Node> {
        let needle = name.to_lowercase();
        self.store
            .iter()
            .find(|node| node.parent_id == Some(parent_id) && node.name.to_lowercase() == needle)
    }

    /// The node's path recomputed from the `parent_id` chain, ignoring the
    /// cached `path` field. `None` if the id is unknown.
    pub fn full_path(&self, id: NodeId) -> Option<String> {
        let node = self.store.get(id)?;
        if node.is_root() {
            return Some("/".to_string());
        }
        let crumbs = self.breadcrumbs(id);
        let mut path = String::new();
        for crumb in crumbs.iter().skip(1) {
            path.push('/');
            path.push_str(&crumb.name);
        }
        Some(path)
    }

    /// The node's depth (root is 0). `None` if the id is unknown.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.store.get(id)?;
        Some(self.breadcrumbs(id).len().saturating_sub(1))
    }

    /// Whether `candidate` sits somewhere below `ancestor`.
    ///
    /// Walks up from `candidate`'s parent chain, bounded by node count.
    pub fn is_descendant(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.store.get(candidate).and_then(|n| n.parent_id);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.store.len() {
                return false;
            }
            current = self.store.get(id).and_then(|n| n.parent_id);
        }
        false
    }

    /// Resolve a `/`-separated path string to a node, matching segment
    /// names case-insensitively. `/` resolves to the root.
    pub fn resolve_path(&self, path: &str) -> Option<&'a Node> {
        let mut current = self.store.get(self.store.root_id())?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_by_name(current.id, segment)?;
        }
        Some(current)
    }
}
