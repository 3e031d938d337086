//! Error taxonomy for the synchronized store
//!
//! None of these errors reach `read`/`write` callers. They are returned by
//! the remote and local backends, recorded in [`SyncStatistics`] and logged.
//!
//! [`SyncStatistics`]: crate::core::SyncStatistics

use thiserror::Error;

/// Errors produced by the remote bucket, the durable cache and the store itself
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote endpoint unreachable, connection dropped, or request timed out
    #[error("network failure on {key}: {reason}")]
    NetworkFailure {
        /// Document key
        key: String,
        /// Underlying transport error
        reason: String,
    },

    /// GET returned 404. A valid "nothing published yet" state.
    ///
    /// Part of the taxonomy for logs and callers matching on kinds;
    /// [`RemoteBucket::fetch`] reports it as `Ok(None)` rather than as an
    /// error.
    ///
    /// [`RemoteBucket::fetch`]: crate::remote::RemoteBucket::fetch
    #[error("remote document not found: {key}")]
    RemoteNotFound {
        /// Document key
        key: String,
    },

    /// GET returned a non-success status other than 404
    #[error("remote read of {key} failed with status {status}")]
    RemoteReadFailed {
        /// Document key
        key: String,
        /// HTTP status code
        status: u16,
    },

    /// POST returned a non-success status
    #[error("remote write of {key} rejected with status {status}")]
    RemoteWriteRejected {
        /// Document key
        key: String,
        /// HTTP status code
        status: u16,
    },

    /// Durable cache read or write failed
    #[error("local storage failure for {key}: {source}")]
    LocalStorageFailure {
        /// Document key
        key: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Stored or fetched payload is not valid JSON for the document type
    #[error("cannot decode {key}: {source}")]
    DeserializationFailure {
        /// Document key
        key: String,
        /// Underlying decoding error
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded as JSON
    #[error("cannot encode {key}: {source}")]
    SerializationFailure {
        /// Document key
        key: String,
        /// Underlying encoding error
        #[source]
        source: serde_json::Error,
    },

    /// Document keys must be non-empty
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// `SyncedStore::open` was called outside a tokio runtime
    #[error("a tokio runtime is required to open {key}")]
    NoRuntime {
        /// Document key
        key: String,
    },
}

impl StoreError {
    /// Short stable label used in logs and statistics
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NetworkFailure { .. } => "network",
            StoreError::RemoteNotFound { .. } => "not-found",
            StoreError::RemoteReadFailed { .. } => "read-rejected",
            StoreError::RemoteWriteRejected { .. } => "write-rejected",
            StoreError::LocalStorageFailure { .. } => "local-storage",
            StoreError::DeserializationFailure { .. } => "decode",
            StoreError::SerializationFailure { .. } => "encode",
            StoreError::InvalidKey { .. } => "invalid-key",
            StoreError::NoRuntime { .. } => "no-runtime",
        }
    }

    /// Whether retrying later can succeed without intervention
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NetworkFailure { .. } => true,
            StoreError::RemoteReadFailed { status, .. }
            | StoreError::RemoteWriteRejected { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            _ => false,
        }
    }
}

/// Result alias used across the crate
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
