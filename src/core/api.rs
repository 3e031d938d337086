//! Public API for the core module.
//!
//! This module provides the stable public API for core functionality including:
//! - Bucket and cache configuration
//! - Statistics tracking
//!
//! Internal implementation details are not exposed through this API.

// Statistics
pub use super::stats::{StatsSnapshot, SyncStatistics};

// Configuration
pub use super::config::{
    default_cache_dir, default_config_path, resolve_config, resolve_config_with,
    ConfigOverrides, FileConfig, SyncConfig,
};
pub use super::config::{
    DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_BASE_URL,
    ENV_BUCKET, ENV_CACHE_DIR, ENV_KEY_PREFIX, ENV_POLL_SECS, ENV_TIMEOUT_SECS,
};
