//! Durable local cache
//!
//! A string-keyed get/set of JSON documents. Read once when a store opens,
//! written on every accepted value change.

pub mod file;

use crate::error::Result;

pub use file::FileStorage;

/// Trait for durable document caches
pub trait LocalStorage: Send + Sync {
    /// Returns the stored JSON text, `Ok(None)` when nothing is stored
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores JSON text, replacing any previous value
    fn save(&self, key: &str, json: &str) -> Result<()>;
}
