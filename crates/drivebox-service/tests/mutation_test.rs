//! Integration tests for the validated mutation operations.

use std::sync::Arc;

use drivebox_core::error::ErrorKind;
use drivebox_core::types::NodeId;
use drivebox_service::DriveService;
use drivebox_store::MemorySnapshotStore;

fn service() -> DriveService {
    DriveService::open(Arc::new(MemorySnapshotStore::new())).expect("open service")
}

#[test]
fn create_folder_builds_path_from_parent() {
    let mut svc = service();
    let root = svc.root_id();

    let docs = svc.create_folder("docs", root).unwrap();
    assert_eq!(docs.path, "/docs");
    assert_eq!(docs.parent_id, Some(root));

    let reports = svc.create_folder("reports", docs.id).unwrap();
    assert_eq!(reports.path, "/docs/reports");

    let data = reports.folder_data().expect("folder payload");
    assert_eq!(data.counts.files, 0);
    assert_eq!(data.counts.folders, 0);
    assert_eq!(data.size_bytes, 0);
}

#[test]
fn create_folder_validation_order() {
    let mut svc = service();
    let root = svc.root_id();
    svc.create_folder("docs", root).unwrap();

    // Empty name first.
    assert_eq!(
        svc.create_folder("   ", root).unwrap_err().kind,
        ErrorKind::InvalidName
    );
    // Reserved characters next.
    assert_eq!(
        svc.create_folder("a/b", root).unwrap_err().kind,
        ErrorKind::InvalidName
    );
    // Missing parent.
    assert_eq!(
        svc.create_folder("ok", NodeId::new()).unwrap_err().kind,
        ErrorKind::NotAFolder
    );
    // Case-insensitive sibling collision last.
    assert_eq!(
        svc.create_folder("DOCS", root).unwrap_err().kind,
        ErrorKind::NameConflict
    );
}

#[test]
fn rejected_create_leaves_store_untouched() {
    let mut svc = service();
    let root = svc.root_id();
    svc.create_folder("docs", root).unwrap();
    let before = svc.store().len();

    let _ = svc.create_folder("Docs", root);
    assert_eq!(svc.store().len(), before);
}

#[test]
fn rename_is_idempotent_without_modified_at_bump() {
    let mut svc = service();
    let root = svc.root_id();
    let docs = svc.create_folder("docs", root).unwrap();
    let before = svc.node(docs.id).unwrap().modified_at;

    let renamed = svc.rename_item(docs.id, "docs").unwrap();
    assert_eq!(renamed.name, "docs");
    assert_eq!(svc.node(docs.id).unwrap().modified_at, before);

    // Surrounding whitespace trims to the current name and stays a no-op.
    let renamed = svc.rename_item(docs.id, "  docs  ").unwrap();
    assert_eq!(renamed.name, "docs");
    assert_eq!(svc.node(docs.id).unwrap().modified_at, before);
}

#[test]
fn rename_checks_siblings_excluding_self() {
    let mut svc = service();
    let root = svc.root_id();
    let docs = svc.create_folder("docs", root).unwrap();
    svc.create_folder("media", root).unwrap();

    // Collision with another sibling.
    assert_eq!(
        svc.rename_item(docs.id, "Media").unwrap_err().kind,
        ErrorKind::NameConflict
    );
    // Case-only rename of itself is allowed.
    let renamed = svc.rename_item(docs.id, "Docs").unwrap();
    assert_eq!(renamed.name, "Docs");
    assert_eq!(renamed.path, "/Docs");
}

#[test]
fn rename_cascades_descendant_paths() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", a.id).unwrap();
    let c = svc.create_folder("c", b.id).unwrap();

    svc.rename_item(a.id, "renamed").unwrap();

    assert_eq!(svc.node(a.id).unwrap().path, "/renamed");
    assert_eq!(svc.node(b.id).unwrap().path, "/renamed/b");
    assert_eq!(svc.node(c.id).unwrap().path, "/renamed/b/c");
}

#[test]
fn rename_root_keeps_path() {
    let mut svc = service();
    let root = svc.root_id();
    let renamed = svc.rename_item(root, "My Drive").unwrap();
    assert_eq!(renamed.name, "My Drive");
    assert_eq!(renamed.path, "/");
}

#[test]
fn move_rejects_self_and_descendants() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", a.id).unwrap();
    let c = svc.create_folder("c", b.id).unwrap();

    assert_eq!(
        svc.move_item(a.id, a.id).unwrap_err().kind,
        ErrorKind::CyclicMove
    );
    assert_eq!(
        svc.move_item(a.id, b.id).unwrap_err().kind,
        ErrorKind::CyclicMove
    );
    assert_eq!(
        svc.move_item(a.id, c.id).unwrap_err().kind,
        ErrorKind::CyclicMove
    );
}

#[test]
fn move_rejects_file_and_missing_targets() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();

    assert_eq!(
        svc.move_item(a.id, NodeId::new()).unwrap_err().kind,
        ErrorKind::NotAFolder
    );
}

#[test]
fn move_is_idempotent_without_modified_at_bump() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let before = svc.node(a.id).unwrap().modified_at;

    let moved = svc.move_item(a.id, root).unwrap();
    assert_eq!(moved.parent_id, Some(root));
    assert_eq!(svc.node(a.id).unwrap().modified_at, before);
}

#[test]
fn move_updates_parent_and_cascades_paths() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", root).unwrap();
    let child = svc.create_folder("child", a.id).unwrap();

    let moved = svc.move_item(a.id, b.id).unwrap();
    assert_eq!(moved.parent_id, Some(b.id));
    assert_eq!(moved.path, "/b/a");
    assert_eq!(svc.node(child.id).unwrap().path, "/b/a/child");

    // Both parents' stats reflect the move.
    let root_stats = svc.node(root).unwrap().folder_data().unwrap();
    assert_eq!(root_stats.counts.folders, 1);
    let b_stats = svc.node(b.id).unwrap().folder_data().unwrap();
    assert_eq!(b_stats.counts.folders, 1);
}

#[test]
fn move_rejects_sibling_collision_at_target() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", root).unwrap();
    svc.create_folder("a", b.id).unwrap();

    assert_eq!(
        svc.move_item(a.id, b.id).unwrap_err().kind,
        ErrorKind::NameConflict
    );
}

#[test]
fn acyclicity_holds_after_mutation_sequences() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", root).unwrap();
    let c = svc.create_folder("c", a.id).unwrap();
    svc.move_item(c.id, b.id).unwrap();
    svc.move_item(b.id, a.id).unwrap();

    // Every node reaches the root by following parent ids.
    let ids: Vec<NodeId> = svc.store().iter().map(|n| n.id).collect();
    for id in ids {
        let crumbs = svc.breadcrumbs(id);
        assert_eq!(crumbs.first().map(|c| c.id), Some(root));
        assert_eq!(crumbs.last().map(|c| c.id), Some(id));
        assert!(crumbs.len() <= svc.store().len());
    }
}

#[test]
fn remove_cascades_and_reports_count() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", a.id).unwrap();
    svc.create_folder("c", b.id).unwrap();
    svc.create_folder("keep", root).unwrap();

    let outcome = svc.remove_item(a.id).unwrap();
    assert_eq!(outcome.removed.len(), 3);
    assert_eq!(svc.store().len(), 2); // root + keep

    assert_eq!(
        svc.remove_item(a.id).unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[test]
fn remove_relocates_cursor_into_surviving_ancestor() {
    let mut svc = service();
    let root = svc.root_id();
    let a = svc.create_folder("a", root).unwrap();
    let b = svc.create_folder("b", a.id).unwrap();
    svc.set_current_folder(b.id).unwrap();

    let outcome = svc.remove_item(a.id).unwrap();
    assert_eq!(outcome.cursor_relocated_to, Some(root));
    assert_eq!(svc.current_folder_id(), root);
}

#[test]
fn folder_stats_track_direct_children() {
    let mut svc = service();
    let root = svc.root_id();
    let docs = svc.create_folder("docs", root).unwrap();
    svc.create_folder("nested", docs.id).unwrap();

    let root_stats = svc.node(root).unwrap().folder_data().unwrap();
    assert_eq!(root_stats.counts.folders, 1);

    svc.remove_item(docs.id).unwrap();
    let root_stats = svc.node(root).unwrap().folder_data().unwrap();
    assert_eq!(root_stats.counts.folders, 0);
}

#[test]
fn node_view_orders_folders_before_files() {
    let mut svc = service();
    let root = svc.root_id();
    svc.create_folder("zeta", root).unwrap();
    svc.create_folder("alpha", root).unwrap();

    let view = svc.node_view(root).unwrap();
    assert_eq!(view.children.len(), 2);
    assert_eq!(view.children[0].name, "alpha");
    assert_eq!(view.children[1].name, "zeta");
    assert_eq!(view.node_count(), 3);
}
