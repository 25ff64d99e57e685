//! Wire records as the task API returns them, and their normalization into
//! core types.
//!
//! Every field except `id` is optional and lenient: a field with the wrong
//! JSON type reads as absent instead of failing the whole record.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use crewplan_core::{
    parse_instant, parse_session_timestamp, Employee, Priority, RawDuration, Task, TaskStatus,
    WorkSession,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Read a field, treating a type mismatch as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Ids and enum-ish fields arrive as either strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Int(i64),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Text(s) => f.write_str(s.trim()),
            RawScalar::Int(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status_label: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub completion_status: Option<String>,
}

impl SessionRecord {
    /// `None` when `start_time` is missing or unparseable, or `end_time` is
    /// present but unparseable.
    pub fn normalize(&self, task_id: &str) -> Option<WorkSession> {
        let Some(start) = self.start_time.as_deref().and_then(parse_session_timestamp) else {
            debug!(task_id, start_time = ?self.start_time, "dropping session without a usable start");
            return None;
        };

        let end = match self.end_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match parse_session_timestamp(raw) {
                Some(end) => Some(end),
                None => {
                    debug!(task_id, end_time = raw, "dropping session with an unparseable end");
                    return None;
                }
            },
        };

        Some(WorkSession {
            start,
            end,
            status: self.status.clone(),
            status_label: self.status_label.clone(),
            completion_status: self.completion_status.clone(),
        })
    }
}

/// One task as stored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RawScalar,
    #[serde(default, deserialize_with = "lenient")]
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_assigned_to: Option<RawScalar>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_assigned_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_priority: Option<RawScalar>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_duration: Option<RawDuration>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_spent: Option<RawDuration>,
    #[serde(default, deserialize_with = "lenient")]
    pub completed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub task_sessions: Option<Vec<SessionRecord>>,
}

impl TaskRecord {
    /// Normalize into the engine's task. Task instants without a zone are
    /// read in `tz`; session timestamps without a zone are UTC.
    pub fn normalize(&self, tz: Tz) -> Task {
        let id = self.id.to_string();
        let instant = |raw: &Option<String>| -> Option<DateTime<Utc>> {
            raw.as_deref().and_then(|s| parse_instant(s, tz))
        };

        let sessions = self
            .task_sessions
            .iter()
            .flatten()
            .filter_map(|s| s.normalize(&id))
            .collect();

        Task {
            name: self.task_name.clone().unwrap_or_default(),
            status: self
                .task_status
                .as_deref()
                .map(TaskStatus::parse)
                .unwrap_or_default(),
            assigned_to: self
                .task_assigned_to
                .as_ref()
                .map(ToString::to_string)
                .filter(|s| !s.is_empty()),
            priority: self
                .task_priority
                .as_ref()
                .map(|p| Priority::parse(&p.to_string()))
                .unwrap_or_default(),
            duration: self.task_duration.as_ref().map_or(0.0, RawDuration::hours),
            created_at: instant(&self.task_created_at),
            assigned_date: instant(&self.task_assigned_date),
            updated_at: instant(&self.task_updated_at),
            completed_at: instant(&self.completed_at),
            time_spent: self
                .time_spent
                .as_ref()
                .map(RawDuration::hours)
                .filter(|h| *h > 0.0),
            sessions,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: RawScalar,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub designation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub manager_id: Option<RawScalar>,
}

impl EmployeeRecord {
    pub fn normalize(&self) -> Employee {
        Employee {
            id: self.id.to_string(),
            name: self.name.clone().unwrap_or_default(),
            designation: self.designation.clone().unwrap_or_default(),
            manager_id: self.manager_id.as_ref().map(ToString::to_string),
        }
    }
}
