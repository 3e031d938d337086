//! Common test utilities and helpers
#![allow(dead_code, unused_imports)]

pub mod bucket;
pub mod server;

pub use self::bucket::{FailingStorage, ScriptedBucket, SlowStorage};
pub use self::server::{MockServer, Reply};

use kvsync::core::SyncConfig;
use kvsync::local::{FileStorage, LocalStorage};
use kvsync::remote::RemoteBucket;
use kvsync::store::{Document, SyncedStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Config with the recurring pull disabled and a short request timeout
pub fn test_config(cache_dir: &Path) -> SyncConfig {
    SyncConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        bucket: "test-bucket".to_string(),
        poll_interval: Duration::ZERO,
        request_timeout: Duration::from_secs(2),
        cache_dir: cache_dir.to_path_buf(),
        ..SyncConfig::default()
    }
}

/// Opens a store backed by `remote` and a file cache under `cache_dir`
pub fn open_store<T: Document>(
    key: &str,
    default: T,
    remote: Arc<dyn RemoteBucket>,
    cache_dir: &Path,
) -> SyncedStore<T> {
    let local: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(cache_dir));
    SyncedStore::open(key, default, remote, local, &test_config(cache_dir)).unwrap()
}

/// Polls `condition` until it holds, panicking after a few seconds
pub async fn wait_until<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let waited = tokio::time::timeout(WAIT_LIMIT, async {
        while !condition() {
            tokio::time::sleep(WAIT_STEP).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

/// Waits for the pull a store runs right after opening
pub async fn settle_initial_pull<T: Document>(store: &SyncedStore<T>, bucket: &ScriptedBucket) {
    wait_until("initial pull to start", || bucket.get_count() >= 1).await;
    wait_until("initial pull to finish", || !store.is_syncing()).await;
}
