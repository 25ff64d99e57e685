//! Task payload parser.

use anyhow::Result;
use chrono_tz::Tz;
use crewplan_core::Task;
use tracing::debug;

use super::parse_records;
use crate::types::TaskRecord;

/// Parse a task payload and normalize each record, reading naive task
/// instants in `tz`.
pub fn parse_tasks_json(json: &str, tz: Tz) -> Result<Vec<Task>> {
    let records: Vec<TaskRecord> = parse_records(json, "task")?;
    debug!(count = records.len(), "parsed task records");
    Ok(records.iter().map(|r| r.normalize(tz)).collect())
}
