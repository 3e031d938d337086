//! In-process bucket for tests, benches and offline runs

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::RemoteBucket;
use crate::error::{Result, StoreError};

/// Bucket kept in a process-local map
///
/// Can be switched offline, in which case every call fails the way an
/// unreachable endpoint would.
#[derive(Debug, Default)]
pub struct MemoryBucket {
    documents: Mutex<HashMap<String, Value>>,
    offline: AtomicBool,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bucket that never answers
    pub fn unreachable() -> Self {
        let bucket = Self::default();
        bucket.set_offline(true);
        bucket
    }

    pub fn with_document(self, key: &str, document: Value) -> Self {
        self.insert(key, document);
        self
    }

    pub fn insert(&self, key: &str, document: Value) {
        if let Ok(mut guard) = self.documents.lock() {
            guard.insert(key.to_string(), document);
        }
    }

    /// Current document, bypassing the offline switch
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents
            .lock()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self, key: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::NetworkFailure {
                key: key.to_string(),
                reason: "bucket offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBucket for MemoryBucket {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>> {
        self.check_online(key)?;
        Ok(self.document(key))
    }

    async fn replace(&self, key: &str, document: &Value) -> Result<()> {
        self.check_online(key)?;
        self.insert(key, document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let bucket = MemoryBucket::new();
        assert!(bucket.fetch("athletes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_then_fetch() {
        let bucket = MemoryBucket::new();
        bucket.replace("athletes", &json!([{"id": "1"}])).await.unwrap();
        assert_eq!(
            bucket.fetch("athletes").await.unwrap(),
            Some(json!([{"id": "1"}]))
        );
    }

    #[tokio::test]
    async fn test_offline_bucket_fails_with_network_error() {
        let bucket = MemoryBucket::unreachable().with_document("k", json!(1));
        let err = bucket.fetch("k").await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert!(bucket.replace("k", &json!(2)).await.is_err());
        assert_eq!(bucket.document("k"), Some(json!(1)));
    }
}
