//! End-to-end archive scenario against a file-backed SQLite database.
//!
//! One run for `https://example.org/a` with body `hello`, a child URL added
//! twice, and a file stored with chunk size 2 and again with chunk size 0.
//! The database is then closed and reopened to show every row survived.

use std::io::Write;

use archiver_core::{sha256_digest, ExternalUuid, FetchResult, HeaderMap};
use archiver_store::{ArchiveStore, ChildUrlInsert, RunRecord, StoreConfig};

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn hello_fetch() -> FetchResult {
    let headers: HeaderMap = [
        ("Content-Type", "text/html; charset=utf-8"),
        ("Server", "example"),
    ]
    .into_iter()
    .collect();
    FetchResult::new(200, headers, b"hello".to_vec())
}

#[tokio::test]
async fn full_run_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("data.sqlite"));

    let mut data_file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
    data_file.write_all(b"data").unwrap();
    data_file.flush().unwrap();

    let store = ArchiveStore::open(&config).await.unwrap();
    let uuid = ExternalUuid::from("67e55044-10b1-426f-9247-bb680e5fe0c8");
    let run = RunRecord::begin(&store, "https://example.org/a", uuid.clone(), hello_fetch())
        .await
        .unwrap();
    assert_eq!(run.content_digest().to_hex(), HELLO_SHA256);

    let first = run.add_child_url("https://example.org/b").await.unwrap();
    let second = run.add_child_url("https://example.org/b").await.unwrap();
    assert!(matches!(first, ChildUrlInsert::Inserted(_)));
    assert_eq!(second, ChildUrlInsert::AlreadyExists(first.id()));

    let chunked = run
        .add_file_chunked(data_file.path(), Some("chunk size 2"), 2)
        .await
        .unwrap();
    let whole = run
        .add_file_chunked(data_file.path(), Some("whole file"), 0)
        .await
        .unwrap();
    assert_ne!(chunked, whole);

    let run_id = run.run_id();
    drop(run);
    store.close().await;

    let reopened = ArchiveStore::open(&config).await.unwrap();
    let stored = reopened.get_run(run_id).await.unwrap().expect("run persisted");
    assert_eq!(stored.body, b"hello");
    assert_eq!(stored.body_digest.to_hex(), HELLO_SHA256);
    assert_eq!(stored.external_uuid, uuid);
    assert_eq!(stored.headers.get("server"), Some("example"));

    let children = reopened.child_urls(run_id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].url, "https://example.org/b");
    assert_eq!(reopened.child_url_count().await.unwrap(), 1);

    let files = reopened.files(run_id).await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].digest, files[1].digest);
    assert_eq!(files[0].digest, sha256_digest(b"data"));
    assert_eq!(files[0].comments.as_deref(), Some("chunk size 2"));
    assert_eq!(files[1].comments.as_deref(), Some("whole file"));

    let report = reopened.verify_run(run_id).await.unwrap();
    assert!(report.is_intact(), "report: {report:?}");
    assert_eq!(report.files.len(), 2);

    reopened.close().await;
}

#[tokio::test]
async fn empty_body_and_empty_file_are_archived() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run = RunRecord::begin(
        &store,
        "https://example.org/empty",
        ExternalUuid::new(),
        FetchResult::new(204, HeaderMap::new(), Vec::new()),
    )
    .await
    .unwrap();
    assert_eq!(*run.content_digest(), sha256_digest(b""));

    let empty = tempfile::NamedTempFile::new().unwrap();
    run.add_file(empty.path(), None).await.unwrap();

    let files = store.files(run.run_id()).await.unwrap();
    assert!(files[0].contents.is_empty());
    assert_eq!(files[0].digest, sha256_digest(b""));
    assert!(files[0].comments.is_none());
}

#[tokio::test]
async fn binary_body_is_stored_byte_exact() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let body: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
    let run = RunRecord::begin(
        &store,
        "https://example.org/blob.bin",
        ExternalUuid::new(),
        FetchResult::new(200, HeaderMap::new(), body.clone()),
    )
    .await
    .unwrap();

    let stored = store.get_run(run.run_id()).await.unwrap().unwrap();
    assert_eq!(stored.body, body);
    assert!(stored.body_digest.matches(&stored.body));
}
