//! Instrumented backends for store tests

use async_trait::async_trait;
use kvsync::error::{Result, StoreError};
use kvsync::local::LocalStorage;
use kvsync::remote::RemoteBucket;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// In-memory bucket that counts requests, records POST bodies, can fail
/// scripted requests and can hold GETs until released
pub struct ScriptedBucket {
    documents: Mutex<HashMap<String, Value>>,
    gets: AtomicUsize,
    puts: Mutex<Vec<Value>>,
    get_failures: Mutex<VecDeque<u16>>,
    put_failures: Mutex<VecDeque<u16>>,
    gate: watch::Sender<bool>,
}

impl Default for ScriptedBucket {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            documents: Mutex::new(HashMap::new()),
            gets: AtomicUsize::new(0),
            puts: Mutex::new(Vec::new()),
            get_failures: Mutex::new(VecDeque::new()),
            put_failures: Mutex::new(VecDeque::new()),
            gate,
        }
    }
}

impl ScriptedBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, key: &str, document: Value) -> Self {
        self.insert(key, document);
        self
    }

    pub fn insert(&self, key: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), document);
    }

    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Bodies of every accepted POST, oldest first
    pub fn puts(&self) -> Vec<Value> {
        self.puts.lock().unwrap().clone()
    }

    /// The next GET answers with `status`
    pub fn fail_next_get(&self, status: u16) {
        self.get_failures.lock().unwrap().push_back(status);
    }

    /// The next POST answers with `status`
    pub fn fail_next_put(&self, status: u16) {
        self.put_failures.lock().unwrap().push_back(status);
    }

    /// GETs started from now on wait until [`release_gets`](Self::release_gets)
    pub fn hold_gets(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_gets(&self) {
        self.gate.send_replace(true);
    }
}

#[async_trait]
impl RemoteBucket for ScriptedBucket {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let failure = self.get_failures.lock().unwrap().pop_front();
        if let Some(status) = failure {
            return Err(StoreError::RemoteReadFailed {
                key: key.to_string(),
                status,
            });
        }
        Ok(self.document(key))
    }

    async fn replace(&self, key: &str, document: &Value) -> Result<()> {
        let failure = self.put_failures.lock().unwrap().pop_front();
        if let Some(status) = failure {
            return Err(StoreError::RemoteWriteRejected {
                key: key.to_string(),
                status,
            });
        }
        self.puts.lock().unwrap().push(document.clone());
        self.insert(key, document.clone());
        Ok(())
    }
}

/// Durable cache that serves a fixed snapshot and refuses every save
pub struct FailingStorage {
    snapshot: Option<String>,
}

impl FailingStorage {
    pub fn new(snapshot: Option<&str>) -> Self {
        Self {
            snapshot: snapshot.map(str::to_string),
        }
    }
}

impl LocalStorage for FailingStorage {
    fn load(&self, _key: &str) -> Result<Option<String>> {
        Ok(self.snapshot.clone())
    }

    fn save(&self, key: &str, _json: &str) -> Result<()> {
        Err(StoreError::LocalStorageFailure {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
        })
    }
}

/// In-memory durable cache whose saves block the calling thread for a while
pub struct SlowStorage {
    files: Mutex<HashMap<String, String>>,
    delay: std::time::Duration,
    saves: AtomicUsize,
}

impl SlowStorage {
    pub fn new(delay: std::time::Duration) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            delay,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        let files = self.files.lock().unwrap();
        files.get(key).map(|text| serde_json::from_str(text).unwrap())
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LocalStorage for SlowStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.files.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        std::thread::sleep(self.delay);
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), json.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
