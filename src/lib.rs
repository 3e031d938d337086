//! # kvsync
//!
//! `kvsync` keeps JSON documents replicated between a local cache and a
//! plain HTTP key-value bucket. Reads are served from memory, writes are
//! applied optimistically and replicated in the background, and concurrent
//! additions to collections of records are merged by `id`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kvsync::core::SyncConfig;
//! use kvsync::local::FileStorage;
//! use kvsync::remote::HttpBucket;
//! use kvsync::store::SyncedStore;
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig {
//!         bucket: "my-bucket".to_string(),
//!         ..SyncConfig::default()
//!     };
//!     let remote = Arc::new(HttpBucket::new(config.clone())?);
//!     let local = Arc::new(FileStorage::new(config.cache_dir.clone()));
//!
//!     let store = SyncedStore::open("athletes", json!([]), remote, local, &config)?;
//!     store.write(|current: &Value| {
//!         let mut records = current.as_array().cloned().unwrap_or_default();
//!         records.push(json!({ "id": "1", "fullName": "Ana" }));
//!         Value::Array(records)
//!     });
//!     store.flush().await;
//!     println!("{}", store.read());
//!     store.close().await;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod core;
pub mod error;
pub mod local;
pub mod logging;
pub mod remote;
pub mod roster;
pub mod store;
pub mod utils;

pub use crate::core::SyncConfig;
pub use error::StoreError;
pub use store::{PullOutcome, SyncedStore};
