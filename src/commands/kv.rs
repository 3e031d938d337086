//! Generic document commands: get, put, add

use anyhow::{Context, Result};
use serde_json::Value;

use super::{settle, CommandContext};
use crate::roster::generate_record_id;
use crate::store::{record_id, PullOutcome, ID_FIELD};

/// Prints the current document for `key`, refreshed from the bucket
pub async fn handle_get_command(ctx: &CommandContext, key: &str) -> Result<Value> {
    let store = ctx.open(key, Value::Null)?;
    match store.pull().await {
        PullOutcome::Failed => eprintln!("⚠️  Remote unavailable, showing cached copy"),
        PullOutcome::NotFound => eprintln!("Nothing published under {key} yet"),
        _ => {}
    }

    let value = store.read();
    println!("{}", serde_json::to_string_pretty(&value)?);
    ctx.report(&store);
    Ok(value)
}

/// Replaces the document for `key`
///
/// Collections of records are still merged by `id` with what the bucket
/// holds, so records other clients added are kept.
pub async fn handle_put_command(ctx: &CommandContext, key: &str, json: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(json).context("document is not valid JSON")?;

    let store = ctx.open(key, Value::Null)?;
    store.set(value);
    settle(&store).await;

    let result = store.read();
    println!("{}", serde_json::to_string_pretty(&result)?);
    ctx.report(&store);
    Ok(result)
}

/// Appends one record to the collection stored under `key`
pub async fn handle_add_command(ctx: &CommandContext, key: &str, json: &str) -> Result<Value> {
    let record = prepare_record(serde_json::from_str(json).context("record is not valid JSON")?)?;

    let store = ctx.open(key, Value::Array(Vec::new()))?;
    store.pull().await;
    let current = store.read();
    if !matches!(current, Value::Array(_) | Value::Null) {
        anyhow::bail!("{key} does not hold a collection");
    }

    let added = record.clone();
    store.write(move |current| append_record(current, &added));
    settle(&store).await;

    println!("{}", serde_json::to_string_pretty(&record)?);
    ctx.report(&store);
    Ok(record)
}

/// Checks that a record is an object and gives it an `id` if it has none
pub fn prepare_record(value: Value) -> Result<Value> {
    let Value::Object(mut fields) = value else {
        anyhow::bail!("record must be a JSON object");
    };
    match fields.get(ID_FIELD) {
        None => {
            fields.insert(ID_FIELD.to_string(), Value::String(generate_record_id()));
        }
        Some(Value::String(id)) if !id.is_empty() => {}
        Some(_) => anyhow::bail!("record {ID_FIELD} must be a non-empty string"),
    }
    Ok(Value::Object(fields))
}

/// Appends `record`, replacing an existing record with the same id
pub fn append_record(current: &Value, record: &Value) -> Value {
    let id = record_id(record);
    let mut items: Vec<Value> = match current {
        Value::Array(items) => items
            .iter()
            .filter(|item| id.is_none() || record_id(item) != id)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };
    items.push(record.clone());
    Value::Array(items)
}
