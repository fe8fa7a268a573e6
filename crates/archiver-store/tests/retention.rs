//! Deleting runs follows a RESTRICT policy: a run that owns child URLs or
//! files is kept.

use archiver_core::{ExternalUuid, FetchResult, HeaderMap, RunId};
use archiver_store::{ArchiveStore, RunRecord, StoreError};

async fn new_run(store: &ArchiveStore) -> RunRecord {
    RunRecord::begin(
        store,
        "https://example.org/a",
        ExternalUuid::new(),
        FetchResult::new(200, HeaderMap::new(), b"body".to_vec()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn childless_run_can_be_deleted() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run = new_run(&store).await;

    store.delete_run(run.run_id()).await.unwrap();
    assert!(store.get_run(run.run_id()).await.unwrap().is_none());
}

#[tokio::test]
async fn run_with_child_url_is_kept() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run = new_run(&store).await;
    run.add_child_url("https://example.org/b").await.unwrap();

    match store.delete_run(run.run_id()).await {
        Err(StoreError::RunHasChildren {
            run_id,
            child_urls,
            files,
        }) => {
            assert_eq!(run_id, run.run_id());
            assert_eq!(child_urls, 1);
            assert_eq!(files, 0);
        }
        other => panic!("expected RunHasChildren, got: {other:?}"),
    }
    assert!(store.get_run(run.run_id()).await.unwrap().is_some());
}

#[tokio::test]
async fn run_with_file_is_kept() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    let run = new_run(&store).await;
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), b"data").unwrap();
    run.add_file(tmp.path(), None).await.unwrap();

    assert!(matches!(
        store.delete_run(run.run_id()).await,
        Err(StoreError::RunHasChildren { files: 1, .. })
    ));
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let store = ArchiveStore::open_in_memory().await.unwrap();
    assert!(matches!(
        store.delete_run(RunId(77)).await,
        Err(StoreError::RunNotFound(RunId(77)))
    ));
}
