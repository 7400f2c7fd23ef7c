//! Integration tests for the upload ingestion pipeline.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use drivebox_core::config::ingest::IngestConfig;
use drivebox_core::error::ErrorKind;
use drivebox_ingest::{BatchSource, DroppedFile, IngestPipeline, PipelineState, ProgressFn};
use drivebox_service::DriveService;
use drivebox_store::MemorySnapshotStore;

type Events = Arc<StdMutex<Vec<(u64, u64)>>>;

fn recording() -> (ProgressFn, Events) {
    let events: Events = Arc::new(StdMutex::new(Vec::new()));
    let sink = events.clone();
    let callback: ProgressFn = Arc::new(move |loaded, total| {
        sink.lock().unwrap().push((loaded, total));
    });
    (callback, events)
}

fn pipeline(config: IngestConfig) -> (IngestPipeline, Events) {
    let service = DriveService::open(Arc::new(MemorySnapshotStore::new())).expect("open service");
    let (callback, events) = recording();
    (
        IngestPipeline::new(Arc::new(Mutex::new(service)), config, callback),
        events,
    )
}

fn instant_config() -> IngestConfig {
    IngestConfig {
        chunk_size: 2,
        progress_debounce_ms: 0,
        max_batch_files: 10_000,
    }
}

#[tokio::test]
async fn flat_batch_attaches_files_to_current_folder() {
    let (pipeline, _) = pipeline(instant_config());

    let files = vec![
        DroppedFile::new("a.txt", 10).with_mime("text/plain"),
        DroppedFile::new("b.txt", 20),
    ];
    let outcome = pipeline.ingest_files(files).await.unwrap();

    assert_eq!(outcome.source, BatchSource::Flat);
    assert_eq!(outcome.created.len(), 2);

    let svc = pipeline.service();
    let svc = svc.lock().await;
    let root = svc.root_id();
    for node in &outcome.created {
        assert_eq!(node.parent_id, Some(root));
        assert!(node.is_file());
    }
    assert_eq!(svc.node(root).unwrap().folder_data().unwrap().counts.files, 2);
    assert_eq!(svc.node(root).unwrap().folder_data().unwrap().size_bytes, 30);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn leading_dot_slash_stays_flat() {
    let (pipeline, _) = pipeline(instant_config());

    let outcome = pipeline
        .ingest_folder(vec![DroppedFile::new("a.txt", 5)], vec!["./a.txt".into()])
        .await
        .unwrap();

    assert_eq!(outcome.source, BatchSource::Flat);
    assert_eq!(outcome.created.len(), 1);
}

#[tokio::test]
async fn one_directory_entry_makes_the_whole_batch_folder_sourced() {
    let (pipeline, _) = pipeline(instant_config());

    let files = vec![DroppedFile::new("a.txt", 5), DroppedFile::new("b.txt", 5)];
    let paths = vec!["folder/a.txt".to_string(), "b.txt".to_string()];
    let outcome = pipeline.ingest_folder(files, paths).await.unwrap();

    assert_eq!(outcome.source, BatchSource::FolderSourced);
    // Exactly one new folder plus the two files.
    assert_eq!(outcome.created.len(), 3);
    let folders: Vec<_> = outcome.created.iter().filter(|n| n.is_folder()).collect();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "folder");
    assert_eq!(folders[0].path, "/folder");

    let svc = pipeline.service();
    let svc = svc.lock().await;
    let a = svc.resolve_path("/folder/a.txt").expect("nested file");
    assert_eq!(a.parent_id, Some(folders[0].id));
    assert!(svc.resolve_path("/b.txt").is_some());
}

#[tokio::test]
async fn shared_prefixes_are_created_once() {
    let (pipeline, _) = pipeline(instant_config());

    let files = vec![
        DroppedFile::new("x.txt", 1),
        DroppedFile::new("y.txt", 1),
        DroppedFile::new("z.txt", 1),
    ];
    let paths = vec![
        "shared/x.txt".to_string(),
        "shared/y.txt".to_string(),
        "shared/deep/z.txt".to_string(),
    ];
    let outcome = pipeline.ingest_folder(files, paths).await.unwrap();

    let folders: Vec<_> = outcome.created.iter().filter(|n| n.is_folder()).collect();
    assert_eq!(folders.len(), 2); // shared, shared/deep
    assert_eq!(outcome.created.len(), 5);
}

#[tokio::test]
async fn existing_folders_are_reused_not_duplicated() {
    let (pipeline, _) = pipeline(instant_config());
    let docs_id = {
        let svc = pipeline.service();
        let mut svc = svc.lock().await;
        let root = svc.root_id();
        svc.create_folder("Docs", root).unwrap().id
    };

    let outcome = pipeline
        .ingest_folder(
            vec![DroppedFile::new("a.txt", 1)],
            vec!["docs/a.txt".to_string()],
        )
        .await
        .unwrap();

    // Case-insensitive reuse: only the file is new.
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.created[0].parent_id, Some(docs_id));
}

#[tokio::test]
async fn progress_is_monotone_with_forced_endpoints() {
    let (pipeline, events) = pipeline(instant_config());

    let files: Vec<DroppedFile> = (0..5)
        .map(|i| DroppedFile::new(format!("f{i}.bin"), 10))
        .collect();
    pipeline.ingest_files(files).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&(0, 50)));
    assert_eq!(events.last(), Some(&(50, 50)));
    for pair in events.windows(2) {
        assert!(pair[0].0 <= pair[1].0, "progress went backwards: {pair:?}");
        assert_eq!(pair[0].1, 50);
    }
}

#[tokio::test]
async fn second_drop_is_rejected_while_in_flight() {
    let (pipeline, _) = pipeline(IngestConfig {
        chunk_size: 1,
        progress_debounce_ms: 0,
        max_batch_files: 10_000,
    });

    let first: Vec<DroppedFile> = (0..4)
        .map(|i| DroppedFile::new(format!("f{i}.bin"), 10))
        .collect();
    let second = vec![DroppedFile::new("late.bin", 10)];

    let (r1, r2) = tokio::join!(pipeline.ingest_files(first), async {
        // Let the first batch get past its busy guard.
        tokio::task::yield_now().await;
        pipeline.ingest_files(second).await
    });

    let outcome = r1.unwrap();
    assert_eq!(outcome.created.len(), 4);
    assert_eq!(r2.unwrap_err().kind, ErrorKind::Busy);

    // The rejected drop corrupted nothing.
    let svc = pipeline.service();
    let svc = svc.lock().await;
    assert_eq!(svc.store().len(), 5); // root + 4 files
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn name_conflict_fails_the_batch_atomically() {
    let (pipeline, events) = pipeline(instant_config());
    {
        let svc = pipeline.service();
        let mut svc = svc.lock().await;
        let root = svc.root_id();
        let existing = vec![drivebox_entity::Node::new_file(
            "a.txt", root, "/a.txt", 1, None,
        )];
        svc.insert_batch(existing).unwrap();
    }

    let batch = vec![DroppedFile::new("b.txt", 10), DroppedFile::new("A.TXT", 10)];
    let err = pipeline.ingest_files(batch).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);

    // Nothing from the failed batch was committed, not even b.txt.
    let svc = pipeline.service();
    let svc = svc.lock().await;
    assert!(svc.resolve_path("/b.txt").is_none());
    assert_eq!(svc.store().len(), 2);
    assert_eq!(pipeline.state(), PipelineState::Idle);

    // Failure resets progress to zero.
    assert_eq!(events.lock().unwrap().last(), Some(&(0, 20)));
}

#[tokio::test]
async fn duplicate_names_within_a_batch_are_rejected() {
    let (pipeline, _) = pipeline(instant_config());

    let batch = vec![DroppedFile::new("same.txt", 1), DroppedFile::new("Same.txt", 1)];
    let err = pipeline.ingest_files(batch).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);
}

#[tokio::test]
async fn oversized_batches_are_rejected_up_front() {
    let (pipeline, _) = pipeline(IngestConfig {
        chunk_size: 2,
        progress_debounce_ms: 0,
        max_batch_files: 2,
    });

    let batch: Vec<DroppedFile> = (0..3)
        .map(|i| DroppedFile::new(format!("f{i}.bin"), 1))
        .collect();
    let err = pipeline.ingest_files(batch).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Ingestion);

    let svc = pipeline.service();
    let svc = svc.lock().await;
    assert_eq!(svc.store().len(), 1);
}

#[tokio::test]
async fn mismatched_path_count_is_an_ingestion_error() {
    let (pipeline, _) = pipeline(instant_config());
    let err = pipeline
        .ingest_folder(vec![DroppedFile::new("a.txt", 1)], vec![])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Ingestion);
}

#[tokio::test]
async fn empty_batch_completes_with_zero_totals() {
    let (pipeline, events) = pipeline(instant_config());
    let outcome = pipeline.ingest_files(Vec::new()).await.unwrap();
    assert!(outcome.created.is_empty());

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&(0, 0)));
    assert_eq!(events.last(), Some(&(0, 0)));
}
