//! One replicated document: local cache, pull loop and serialized writes

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::merge::{merge, merge_strategy};
use super::state::{ActivityCounter, Updater, WriteQueue};
use crate::core::{SyncConfig, SyncStatistics};
use crate::error::{Result, StoreError};
use crate::local::LocalStorage;
use crate::remote::RemoteBucket;

/// Values a store can hold
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Document for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Result of one pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote value replaced the cache
    Applied,
    /// Remote value equals the cache
    Unchanged,
    /// Nothing published under the key yet; cache untouched
    NotFound,
    /// Writes were pending, so the pull did not run
    Skipped,
    /// A write was accepted while fetching; the fetched value was dropped
    Discarded,
    /// Fetch or decode failed; cache untouched
    Failed,
}

/// Handle to one replicated document
///
/// `read` serves the cache, `write` applies an update locally at once and
/// replicates it in the background. A poller refreshes the cache from the
/// remote bucket until the handle is dropped.
pub struct SyncedStore<T: Document> {
    inner: Arc<Inner<T>>,
    stop_tx: watch::Sender<bool>,
    poller: JoinHandle<()>,
}

struct Inner<T: Document> {
    key: String,
    default: T,
    remote: Arc<dyn RemoteBucket>,
    cache: watch::Sender<T>,
    queue: Mutex<WriteQueue<T>>,
    idle: watch::Sender<bool>,
    /// Latest accepted value, encoded, waiting for the persister
    snapshots: watch::Sender<Snapshot>,
    /// Sequence of the last snapshot the persister handled
    saved: watch::Receiver<u64>,
    activity: ActivityCounter,
    stats: Arc<SyncStatistics>,
    runtime: Handle,
}

/// One encoded value, numbered in acceptance order
#[derive(Clone, Debug, Default)]
struct Snapshot {
    seq: u64,
    json: Option<Arc<str>>,
}

impl<T: Document> SyncedStore<T> {
    /// Opens the store for `key`
    ///
    /// The cache is seeded from durable storage, falling back to `default`
    /// when nothing usable is stored. Never waits on the network: the first
    /// pull runs in the background, then one every `config.poll_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        key: impl Into<String>,
        default: T,
        remote: Arc<dyn RemoteBucket>,
        local: Arc<dyn LocalStorage>,
        config: &SyncConfig,
    ) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime { key: key.clone() })?;

        let stats = Arc::new(SyncStatistics::new());
        let initial = load_snapshot(&key, &default, local.as_ref(), &stats);
        let (cache, _) = watch::channel(initial.clone());
        let (idle, _) = watch::channel(true);
        let (snapshots, snapshot_rx) = watch::channel(Snapshot::default());
        let (saved_tx, saved) = watch::channel(0);

        runtime.spawn(persist_loop(
            key.clone(),
            local,
            Arc::clone(&stats),
            snapshot_rx,
            saved_tx,
        ));

        info!(key = %key, remote = remote.name(), "opened store");

        let inner = Arc::new(Inner {
            key,
            default,
            remote,
            cache,
            queue: Mutex::new(WriteQueue::new(initial)),
            idle,
            snapshots,
            saved,
            activity: ActivityCounter::default(),
            stats,
            runtime,
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let poller = inner.runtime.spawn(poll_loop(
            Arc::downgrade(&inner),
            config.poll_interval,
            stop_rx,
        ));

        Ok(Self {
            inner,
            stop_tx,
            poller,
        })
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Current cached value. Never blocks on the network.
    pub fn read(&self) -> T {
        T::clone(&self.inner.cache.borrow())
    }

    /// Applies `updater` to the cache immediately and queues the
    /// read-merge-write cycle that replicates it
    ///
    /// The updater may run more than once: again on top of the converged
    /// document when an earlier queued write finishes first. It must be a
    /// pure function of its input and must not call back into this store.
    pub fn write<F>(&self, updater: F)
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Inner::write(&self.inner, Arc::new(updater));
    }

    /// Replaces the whole value
    pub fn set(&self, value: T) {
        self.write(move |_| value.clone());
    }

    /// True while a pull runs or any write has not finished its remote cycle
    pub fn is_syncing(&self) -> bool {
        self.inner.activity.is_active() || !*self.inner.idle.borrow()
    }

    /// Refreshes the cache from the remote bucket now
    pub async fn pull(&self) -> PullOutcome {
        self.inner.pull().await
    }

    /// Waits until every queued write has finished its remote cycle and
    /// the resulting value is on durable storage
    pub async fn flush(&self) {
        let mut idle_rx = self.inner.idle.subscribe();
        let _ = idle_rx.wait_for(|idle| *idle).await;

        let target = self.inner.snapshots.borrow().seq;
        let mut saved = self.inner.saved.clone();
        let _ = saved.wait_for(|seq| *seq >= target).await;
    }

    /// Receiver notified on every accepted value
    ///
    /// Do not hold a `borrow()` of the receiver while calling `write`.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.cache.subscribe()
    }

    pub fn stats(&self) -> &SyncStatistics {
        &self.inner.stats
    }

    /// Number of writes whose remote cycle has not finished
    pub fn pending_writes(&self) -> usize {
        self.inner.lock_queue().pending_len()
    }

    /// Flushes queued writes and stops the poller
    pub async fn close(mut self) {
        self.flush().await;
        self.stop_tx.send_replace(true);
        let _ = (&mut self.poller).await;
    }
}

impl<T: Document> Drop for SyncedStore<T> {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

impl<T: Document> Inner<T> {
    fn lock_queue(&self) -> MutexGuard<'_, WriteQueue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the cache and hands the encoded value to the persister.
    /// Callers hold the queue lock, so snapshots are numbered in cache order;
    /// the file write itself happens off the lock.
    fn accept(&self, queue: &mut WriteQueue<T>, value: T) {
        queue.bump_version();
        match serde_json::to_string(&value) {
            Ok(json) => {
                self.snapshots.send_replace(Snapshot {
                    seq: queue.version(),
                    json: Some(json.into()),
                });
            }
            Err(source) => {
                let err = StoreError::SerializationFailure {
                    key: self.key.clone(),
                    source,
                };
                warn!(key = %self.key, error = %err, "failed to encode local snapshot");
                self.stats.record_local_failure(&err);
            }
        }
        self.cache.send_replace(value);
    }

    fn write(this: &Arc<Self>, updater: Updater<T>) {
        let start_drain = {
            let mut queue = this.lock_queue();
            let current = T::clone(&this.cache.borrow());
            let optimistic = updater(&current);
            let seq = queue.push(&current, updater);
            this.accept(&mut queue, optimistic);
            debug!(key = %this.key, seq, pending = queue.pending_len(), "write accepted");

            let start = queue.begin_drain();
            if start {
                this.idle.send_replace(false);
            }
            start
        };

        if start_drain {
            this.runtime.spawn(Arc::clone(this).drain());
        }
    }

    /// Runs queued write cycles one at a time until the queue is empty
    async fn drain(self: Arc<Self>) {
        let _syncing = self.activity.enter();

        loop {
            let next = self.lock_queue().front_seq();
            if let Some(seq) = next {
                let outcome = self.write_cycle().await;

                let failed = {
                    let mut queue = self.lock_queue();
                    match outcome {
                        Ok(merged) => {
                            let cache = queue.complete(seq, merged);
                            self.accept(&mut queue, cache);
                            SyncStatistics::bump(&self.stats.writes_synced);
                            debug!(key = %self.key, seq, "write synced");
                            false
                        }
                        Err(err) => {
                            // The optimistic value stays and becomes the base for later writes
                            if let Some(kept) = queue.front_local_state() {
                                queue.complete(seq, kept);
                            }
                            warn!(key = %self.key, seq, error = %err, "write not replicated");
                            self.stats.record_write_failure(&err);
                            true
                        }
                    }
                };

                if failed {
                    self.pull().await;
                }
            }

            let done = {
                let mut queue = self.lock_queue();
                let done = queue.end_drain_if_empty();
                if done {
                    self.idle.send_replace(true);
                }
                done
            };
            if done {
                break;
            }
        }
    }

    /// Read-merge-write for the oldest pending write, returning the
    /// document now stored remotely
    async fn write_cycle(&self) -> Result<T> {
        // Merged as raw JSON: records this client cannot decode still survive
        let server = match self.remote.fetch(&self.key).await? {
            Some(value) => value,
            None => self.encode(&self.default)?,
        };

        let local_state = {
            let queue = self.lock_queue();
            queue
                .front_local_state()
                .unwrap_or_else(|| T::clone(&self.cache.borrow()))
        };
        let local = self.encode(&local_state)?;

        let strategy = merge_strategy(&server, &local);
        let merged = merge(&server, &local);
        // Nothing is written back when the merged document does not fit `T`
        let decoded = serde_json::from_value::<T>(merged.clone()).map_err(|source| {
            StoreError::DeserializationFailure {
                key: self.key.clone(),
                source,
            }
        })?;

        self.remote.replace(&self.key, &merged).await?;
        debug!(key = %self.key, ?strategy, "merged document written");
        Ok(decoded)
    }

    async fn pull(&self) -> PullOutcome {
        let start_version = {
            let queue = self.lock_queue();
            if queue.has_pending() {
                SyncStatistics::bump(&self.stats.pulls_skipped);
                return PullOutcome::Skipped;
            }
            queue.version()
        };

        let _syncing = self.activity.enter();

        let value = match self.remote.fetch(&self.key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                SyncStatistics::bump(&self.stats.pulls_not_found);
                debug!(key = %self.key, "nothing published yet");
                return PullOutcome::NotFound;
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "pull failed");
                self.stats.record_pull_failure(&err);
                return PullOutcome::Failed;
            }
        };

        let decoded = match serde_json::from_value::<T>(value.clone()) {
            Ok(decoded) => decoded,
            Err(source) => {
                let err = StoreError::DeserializationFailure {
                    key: self.key.clone(),
                    source,
                };
                warn!(key = %self.key, error = %err, "pulled document unreadable");
                self.stats.record_pull_failure(&err);
                return PullOutcome::Failed;
            }
        };

        let mut queue = self.lock_queue();
        if queue.has_pending() || queue.version() != start_version {
            SyncStatistics::bump(&self.stats.pulls_discarded);
            debug!(key = %self.key, "pull raced a write, result dropped");
            return PullOutcome::Discarded;
        }

        let unchanged = serde_json::to_value(&*self.cache.borrow())
            .map(|current| current == value)
            .unwrap_or(false);
        if unchanged {
            SyncStatistics::bump(&self.stats.pulls_unchanged);
            return PullOutcome::Unchanged;
        }

        SyncStatistics::bump(&self.stats.pulls_applied);
        self.accept(&mut queue, decoded);
        debug!(key = %self.key, "pulled remote document");
        PullOutcome::Applied
    }

    fn encode(&self, value: &T) -> Result<Value> {
        serde_json::to_value(value).map_err(|source| StoreError::SerializationFailure {
            key: self.key.clone(),
            source,
        })
    }
}

/// Pulls once immediately, then on every tick until stopped or the store
/// is gone
async fn poll_loop<T: Document>(
    inner: Weak<Inner<T>>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    match inner.upgrade() {
        Some(inner) => {
            inner.pull().await;
        }
        None => return,
    }

    if period.is_zero() {
        return;
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.pull().await;
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// Writes accepted snapshots to durable storage on the blocking pool
///
/// Only the newest pending snapshot is written; intermediate values are
/// skipped. Ends once the store is gone and the last snapshot is handled.
async fn persist_loop(
    key: String,
    local: Arc<dyn LocalStorage>,
    stats: Arc<SyncStatistics>,
    mut snapshots: watch::Receiver<Snapshot>,
    saved: watch::Sender<u64>,
) {
    while snapshots.changed().await.is_ok() {
        let Snapshot { seq, json } = snapshots.borrow_and_update().clone();
        let Some(json) = json else {
            continue;
        };

        let storage = Arc::clone(&local);
        let file_key = key.clone();
        let result = tokio::task::spawn_blocking(move || storage.save(&file_key, &json))
            .await
            .unwrap_or_else(|join_err| {
                Err(StoreError::LocalStorageFailure {
                    key: key.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, join_err.to_string()),
                })
            });
        if let Err(err) = result {
            warn!(key = %key, error = %err, "failed to persist local snapshot");
            stats.record_local_failure(&err);
        }
        saved.send_replace(seq);
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not contain control characters".to_string(),
        });
    }
    Ok(())
}

/// Reads the durable snapshot, falling back to `default`
fn load_snapshot<T: Document>(
    key: &str,
    default: &T,
    local: &dyn LocalStorage,
    stats: &SyncStatistics,
) -> T {
    let text = match local.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => return default.clone(),
        Err(err) => {
            warn!(key, error = %err, "local snapshot unreadable, using default");
            stats.record_local_failure(&err);
            return default.clone();
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(source) => {
            let err = StoreError::DeserializationFailure {
                key: key.to_string(),
                source,
            };
            warn!(key, error = %err, "local snapshot corrupt, using default");
            stats.record_local_failure(&err);
            default.clone()
        }
    }
}
