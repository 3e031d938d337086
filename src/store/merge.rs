//! Identity-keyed merge of two document snapshots
//!
//! Collections of records carrying a string `id` are merged as a union
//! keyed by `id`, with the local side winning on collisions. Anything else
//! is last-writer-wins: the local document replaces the server's.

use serde_json::Value;
use std::collections::HashMap;

/// Field that identifies a record inside a collection
pub const ID_FIELD: &str = "id";

/// How two snapshots were combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Both sides were record collections
    IdentityUnion,
    /// At least one side was not a record collection
    LocalWins,
}

/// Returns the identity of a record, if it has one
pub fn record_id(value: &Value) -> Option<&str> {
    value.as_object()?.get(ID_FIELD)?.as_str()
}

/// Whether a document is a sequence of identity-bearing records
///
/// An empty array qualifies.
pub fn is_record_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(|item| record_id(item).is_some()),
        _ => false,
    }
}

/// Picks the strategy [`merge`] applies to this pair
pub fn merge_strategy(server: &Value, local: &Value) -> MergeStrategy {
    if is_record_collection(server) && is_record_collection(local) {
        MergeStrategy::IdentityUnion
    } else {
        MergeStrategy::LocalWins
    }
}

/// Merges the server snapshot with the local one
///
/// Records keep the server's order; records only the local side has are
/// appended in local order. A local record replaces the server record with
/// the same `id` in place. Duplicate ids within one side collapse to the
/// last occurrence.
pub fn merge(server: &Value, local: &Value) -> Value {
    match (server, local, merge_strategy(server, local)) {
        (Value::Array(server_items), Value::Array(local_items), MergeStrategy::IdentityUnion) => {
            Value::Array(union_by_id(server_items, local_items))
        }
        _ => local.clone(),
    }
}

fn union_by_id(server_items: &[Value], local_items: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(server_items.len() + local_items.len());
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(merged.capacity());

    for item in server_items.iter().chain(local_items.iter()) {
        let Some(id) = record_id(item) else {
            continue;
        };
        match positions.get(id) {
            Some(&index) => merged[index] = item.clone(),
            None => {
                positions.insert(id, merged.len());
                merged.push(item.clone());
            }
        }
    }

    merged
}
