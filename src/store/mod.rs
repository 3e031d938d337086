//! Replicated documents
//!
//! [`SyncedStore`] keeps one key's local cache and the shared remote bucket
//! converging: instant reads from the cache, optimistic writes replicated by
//! a serialized read-merge-write cycle, and a background pull loop.

pub mod merge;
mod state;
mod synced;

pub use merge::{is_record_collection, merge, merge_strategy, record_id, MergeStrategy, ID_FIELD};
pub use state::Updater;
pub use synced::{Document, PullOutcome, SyncedStore};
