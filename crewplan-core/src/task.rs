//! Task model for the timeline engine.
//!
//! Storage hands us free-form strings; everything here is already normalized.
//! Parsing from the wire shape lives in `crewplan-ingest`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
    OnHold,
}

impl TaskStatus {
    /// Parse a storage status string. Unknown values fall back to `Backlog`.
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "todo" | "to-do" => TaskStatus::Todo,
            "in-progress" | "inprogress" => TaskStatus::InProgress,
            "done" | "completed" | "complete" => TaskStatus::Done,
            "on-hold" | "onhold" | "paused" => TaskStatus::OnHold,
            _ => TaskStatus::Backlog,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    /// Drop everything.
    P0 = 0,
    P1 = 1,
    /// Default for absent or unrecognized priorities.
    #[default]
    P2 = 2,
}

impl Priority {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "p0" | "0" => Priority::P0,
            "p1" | "1" => Priority::P1,
            _ => Priority::P2,
        }
    }
}

/// Lowercase, trim, and fold `_`/space separators into `-`.
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// One contiguous interval of actual work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub start: DateTime<Utc>,
    /// `None` while the session is open.
    pub end: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub status_label: Option<String>,
    pub completion_status: Option<String>,
}

impl WorkSession {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            status: None,
            status_label: None,
            completion_status: None,
        }
    }

    pub fn open(start: DateTime<Utc>) -> Self {
        Self::new(start, None)
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.status_label = Some(label.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_completion_status(mut self, status: impl Into<String>) -> Self {
        self.completion_status = Some(status.into());
        self
    }

    /// First non-empty upstream hint: `status_label` > `completion_status` > `status`.
    pub fn display_hint(&self) -> Option<&str> {
        [&self.status_label, &self.completion_status, &self.status]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Core task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,

    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub priority: Priority,

    /// Estimated effort, fractional hours.
    pub duration: f64,

    pub created_at: Option<DateTime<Utc>>,
    /// Pick-up time. Overrides `created_at` for availability.
    pub assigned_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Already-logged effort, fractional hours.
    pub time_spent: Option<f64>,

    pub sessions: Vec<WorkSession>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: TaskStatus::Backlog,
            assigned_to: None,
            priority: Priority::P2,
            duration: 0.0,
            created_at: None,
            assigned_date: None,
            updated_at: None,
            completed_at: None,
            time_spent: None,
            sessions: Vec::new(),
        }
    }

    pub fn assigned(mut self, developer_id: impl Into<String>) -> Self {
        self.assigned_to = Some(developer_id.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = hours;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_assigned_date(mut self, at: DateTime<Utc>) -> Self {
        self.assigned_date = Some(at);
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_time_spent(mut self, hours: f64) -> Self {
        self.time_spent = Some(hours);
        self
    }

    pub fn with_session(mut self, session: WorkSession) -> Self {
        self.sessions.push(session);
        self
    }

    /// When the task becomes eligible to run.
    pub fn available_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_date.or(self.created_at)
    }

    pub fn is_assigned_to(&self, developer_id: &str) -> bool {
        self.assigned_to.as_deref() == Some(developer_id)
    }

    pub fn has_open_session(&self) -> bool {
        self.sessions.iter().any(WorkSession::is_open)
    }
}
