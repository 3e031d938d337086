//! Follows a document and prints every new value

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;

use super::CommandContext;
use crate::utils::{set_terminal_title, set_terminal_title_and_flush, sync_indicator};

const SPINNER_TICK_MS: u64 = 120;
const SPINNER_TEMPLATE: &str = "{spinner} {prefix:.bold} {wide_msg}";

/// Prints the document for `key` whenever it changes, until Ctrl-C
pub async fn handle_watch_command(ctx: &CommandContext, key: &str) -> Result<()> {
    set_terminal_title(&format!("🔄 kvsync {key}"));

    let store = ctx.open(key, Value::Null)?;
    let mut changes = store.subscribe();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template(SPINNER_TEMPLATE)?);
    spinner.set_prefix(key.to_string());
    spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));

    spinner.println(serde_json::to_string_pretty(&store.read())?);

    let mut status = tokio::time::interval(Duration::from_millis(SPINNER_TICK_MS));
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let value = Value::clone(&changes.borrow_and_update());
                spinner.println(serde_json::to_string_pretty(&value)?);
            }
            _ = status.tick() => {
                spinner.set_message(sync_indicator(store.is_syncing()));
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    spinner.finish_and_clear();
    ctx.report(&store);
    set_terminal_title_and_flush("✅ kvsync");
    Ok(())
}
