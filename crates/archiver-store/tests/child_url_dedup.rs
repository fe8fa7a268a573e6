//! The child-URL table is a global dedup set shared by all runs.

use archiver_core::{ExternalUuid, FetchResult, HeaderMap};
use archiver_store::{ArchiveStore, ChildUrlInsert, RunRecord, StoreConfig};

async fn new_run(store: &ArchiveStore, url: &str) -> RunRecord {
    RunRecord::begin(
        store,
        url,
        ExternalUuid::new(),
        FetchResult::new(200, HeaderMap::new(), url.as_bytes().to_vec()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn same_url_from_different_runs_is_recorded_once() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run_a = new_run(&store, "https://example.org/a").await;
    let run_b = new_run(&store, "https://example.org/c").await;

    let first = run_a.add_child_url("https://example.org/shared").await.unwrap();
    let second = run_b.add_child_url("https://example.org/shared").await.unwrap();

    assert!(first.is_inserted());
    assert_eq!(second, ChildUrlInsert::AlreadyExists(first.id()));
    assert_eq!(store.child_url_count().await.unwrap(), 1);

    // The row stays attributed to the run that discovered it first.
    assert_eq!(store.child_urls(run_a.run_id()).await.unwrap().len(), 1);
    assert!(store.child_urls(run_b.run_id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn distinct_urls_never_collide() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run = new_run(&store, "https://example.org/a").await;

    let b = run.add_child_url("https://example.org/b").await.unwrap();
    let c = run.add_child_url("https://example.org/c").await.unwrap();
    // URLs are compared byte-for-byte; no normalization is applied.
    let b_slash = run.add_child_url("https://example.org/b/").await.unwrap();

    assert!(b.is_inserted() && c.is_inserted() && b_slash.is_inserted());
    assert_ne!(b.id(), c.id());
    let urls: Vec<String> = store
        .child_urls(run.run_id())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://example.org/b",
            "https://example.org/c",
            "https://example.org/b/"
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_racing_on_one_url_leave_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        max_connections: 4,
        ..StoreConfig::file(dir.path().join("race.sqlite"))
    };
    let store = ArchiveStore::open(&config).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let run = new_run(&store, &format!("https://example.org/page/{i}")).await;
            run.add_child_url("https://example.org/contested").await
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ChildUrlInsert::Inserted(_) => inserted += 1,
            ChildUrlInsert::AlreadyExists(_) => {}
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(store.child_url_count().await.unwrap(), 1);
    store.close().await;
}
