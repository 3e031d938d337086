//! Remote bucket access
//!
//! The shared document store only offers whole-document GET and replace.
//! There is no partial update and no conditional write, which is why the
//! store merges on the client before every write.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use http::HttpBucket;
pub use memory::MemoryBucket;

/// Trait for whole-document key-value backends
#[async_trait]
pub trait RemoteBucket: Send + Sync {
    /// Returns a short name for logs
    fn name(&self) -> &str;

    /// Fetches the current document. `Ok(None)` means nothing has been
    /// published under this key yet.
    async fn fetch(&self, key: &str) -> Result<Option<Value>>;

    /// Replaces the whole document
    async fn replace(&self, key: &str, document: &Value) -> Result<()>;
}
