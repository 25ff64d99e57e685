//! Timeline output: the blocks a renderer positions by hour and person.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{normalize_label, TaskStatus, WorkSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockStatus {
    Completed,
    Backlog,
    InProgress,
    Planned,
}

impl BlockStatus {
    /// Map an upstream session label. `None` when the label is not recognized.
    ///
    /// Sessions that are merely "in progress" render neutrally as `Planned`.
    pub fn from_label(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "done" | "completed" | "complete" => Some(BlockStatus::Completed),
            "in-progress" | "inprogress" => Some(BlockStatus::Planned),
            "active" | "running" => Some(BlockStatus::InProgress),
            "backlog" | "todo" | "to-do" => Some(BlockStatus::Backlog),
            _ => None,
        }
    }

    pub fn from_task_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Done => BlockStatus::Completed,
            TaskStatus::InProgress => BlockStatus::Planned,
            TaskStatus::Backlog | TaskStatus::Todo | TaskStatus::OnHold => BlockStatus::Backlog,
        }
    }

    /// Display status of a session block: upstream hints first, then the task.
    pub fn for_session(session: &WorkSession, task_status: TaskStatus) -> Self {
        session
            .display_hint()
            .and_then(Self::from_label)
            .unwrap_or_else(|| Self::from_task_status(task_status))
    }
}

/// One contiguous interval for one task on one local day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub task_id: String,
    pub date: NaiveDate,
    /// Fractional local hour of day.
    pub start_time: f64,
    pub end_time: f64,
    pub status: BlockStatus,
    /// `true` for blocks derived from recorded work, `false` for simulated ones.
    #[serde(default)]
    pub is_session: bool,
}

impl TimeBlock {
    pub fn hours(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

/// Developer id → blocks sorted by `(date, start_time)`.
pub type Schedule = BTreeMap<String, Vec<TimeBlock>>;

pub(crate) fn sort_blocks(blocks: &mut [TimeBlock]) {
    blocks.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.start_time.total_cmp(&b.start_time))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session() -> WorkSession {
        WorkSession::open(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap())
    }

    #[test]
    fn label_beats_completion_status_beats_status() {
        let s = session()
            .with_status("backlog")
            .with_completion_status("completed")
            .with_label("In Progress");
        assert_eq!(
            BlockStatus::for_session(&s, TaskStatus::Done),
            BlockStatus::Planned
        );

        let s = session()
            .with_status("backlog")
            .with_completion_status("completed");
        assert_eq!(
            BlockStatus::for_session(&s, TaskStatus::Backlog),
            BlockStatus::Completed
        );
    }

    #[test]
    fn unknown_label_falls_back_to_task_status() {
        let s = session().with_label("stopped");
        assert_eq!(
            BlockStatus::for_session(&s, TaskStatus::Done),
            BlockStatus::Completed
        );
        assert_eq!(
            BlockStatus::for_session(&session(), TaskStatus::InProgress),
            BlockStatus::Planned
        );
    }

    #[test]
    fn serializes_for_the_renderer() {
        let b = TimeBlock {
            task_id: "t1".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: 10.0,
            end_time: 12.5,
            status: BlockStatus::InProgress,
            is_session: true,
        };
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("\"taskId\":\"t1\""));
        assert!(json.contains("\"date\":\"2026-03-02\""));
        assert!(json.contains("\"startTime\":10.0"));
        assert!(json.contains("\"status\":\"in-progress\""));
        assert!(json.contains("\"isSession\":true"));
    }
}
