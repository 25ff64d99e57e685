//! JSON payload parsers.
//!
//! Payloads are either a bare array of records or an envelope of the shape
//! `{ "data": [...] }`. Records that fail to deserialize (for example a
//! missing `id`) are skipped with a warning; invalid JSON is an error.

pub mod employees;
pub mod tasks;

pub use employees::parse_employees_json;
pub use tasks::parse_tasks_json;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub(crate) fn parse_records<T: DeserializeOwned>(json: &str, kind: &str) -> Result<Vec<T>> {
    let value: Value =
        serde_json::from_str(json).with_context(|| format!("invalid {kind} JSON"))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => bail!("expected a {kind} array or a {{\"data\": [...]}} envelope"),
        },
        _ => bail!("expected a {kind} array or a {{\"data\": [...]}} envelope"),
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => out.push(record),
            Err(err) => warn!(kind, idx, error = %err, "skipping malformed record"),
        }
    }
    Ok(out)
}
