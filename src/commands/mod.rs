//! Command implementations for the `kvsync` binary

pub mod kv;
pub mod roster;
pub mod watch;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::core::SyncConfig;
use crate::local::{FileStorage, LocalStorage};
use crate::remote::{HttpBucket, MemoryBucket, RemoteBucket};
use crate::store::{Document, SyncedStore};

/// Backends and settings shared by every store a command opens
pub struct CommandContext {
    pub config: SyncConfig,
    pub remote: Arc<dyn RemoteBucket>,
    pub local: Arc<dyn LocalStorage>,
    pub verbose: bool,
}

impl CommandContext {
    /// Builds the HTTP bucket, or an unreachable one when `offline`
    pub fn new(config: SyncConfig, offline: bool, verbose: bool) -> Result<Self> {
        let remote: Arc<dyn RemoteBucket> = if offline {
            Arc::new(MemoryBucket::unreachable())
        } else {
            Arc::new(HttpBucket::new(config.clone()).context("invalid remote configuration")?)
        };
        let local: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(config.cache_dir.clone()));
        Ok(Self {
            config,
            remote,
            local,
            verbose,
        })
    }

    /// Uses caller-provided backends
    pub fn with_backends(
        config: SyncConfig,
        remote: Arc<dyn RemoteBucket>,
        local: Arc<dyn LocalStorage>,
    ) -> Self {
        Self {
            config,
            remote,
            local,
            verbose: false,
        }
    }

    pub fn open<T: Document>(&self, key: &str, default: T) -> Result<SyncedStore<T>> {
        SyncedStore::open(
            key,
            default,
            Arc::clone(&self.remote),
            Arc::clone(&self.local),
            &self.config,
        )
        .with_context(|| format!("failed to open {key}"))
    }

    /// Prints the statistics line of a store when verbose
    pub fn report<T: Document>(&self, store: &SyncedStore<T>) {
        if self.verbose {
            eprintln!("{}", store.stats().snapshot().summary(store.key()));
        }
    }
}

/// Waits for a store's writes and tells the user when they stayed local
pub(crate) async fn settle<T: Document>(store: &SyncedStore<T>) {
    store.flush().await;
    let stats = store.stats().snapshot();
    if stats.writes_failed > 0 {
        let reason = stats.last_error.unwrap_or_else(|| "unknown error".to_string());
        eprintln!("⚠️  Saved locally but not replicated: {reason}");
    }
}
