//! Property: for every persisted run, re-hashing the stored body yields the
//! stored digest.

use archiver_core::{ExternalUuid, FetchResult, HeaderMap};
use archiver_store::{ArchiveStore, RunRecord};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stored_body_rehashes_to_stored_digest(
        body in prop::collection::vec(any::<u8>(), 0..2048),
        header_value in "[ -~]{0,40}",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (stored, report) = rt.block_on(async {
            let store = ArchiveStore::open_in_memory().await.unwrap();
            let headers: HeaderMap = [("X-Probe", header_value.as_str())].into_iter().collect();
            let run = RunRecord::begin(
                &store,
                "https://example.org/prop",
                ExternalUuid::new(),
                FetchResult::new(200, headers, body.clone()),
            )
            .await
            .unwrap();
            let stored = store.get_run(run.run_id()).await.unwrap().unwrap();
            let report = store.verify_run(run.run_id()).await.unwrap();
            (stored, report)
        });

        prop_assert_eq!(&stored.body, &body);
        prop_assert!(stored.body_digest.matches(&stored.body));
        prop_assert!(report.is_intact());
        prop_assert_eq!(stored.headers.get("x-probe"), Some(header_value.as_str()));
    }
}
