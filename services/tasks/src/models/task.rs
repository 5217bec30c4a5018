//! Task aggregate: tasks, their comments and the payloads that create or
//! change them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Workflow state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Stored and serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown task status '{}'", s))
    }
}

/// Urgency of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    /// Stored and serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| format!("unknown task priority '{}'", s))
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: i64,
    pub assignee_id: Option<i64>,
    /// Bumped by every successful update; stale writers are rejected
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment entity, owned by its task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Task creation payload; the author is the caller
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub assignee_id: Option<i64>,
}

/// Full replacement of a task's editable fields
///
/// Optional fields left out of the payload overwrite the stored value with
/// `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: i64,
    #[serde(default)]
    pub assignee_id: Option<i64>,
}

/// Comment creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
}

/// Validated task fields handed to the store for insertion
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub author_id: i64,
    pub assignee_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_its_stored_form_only() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        assert!("done".parse::<TaskStatus>().is_err());
        assert!("BLOCKED".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(TaskPriority::Low < TaskPriority::Medium);
        assert!(TaskPriority::Medium < TaskPriority::High);
        assert_eq!("HIGH".parse::<TaskPriority>(), Ok(TaskPriority::High));
    }

    #[test]
    fn new_task_defaults_optional_fields() {
        let payload: NewTask =
            serde_json::from_str(r#"{"title":"Ship","status":"IN_PROGRESS","priority":"LOW"}"#)
                .unwrap();

        assert_eq!(payload.status, TaskStatus::InProgress);
        assert_eq!(payload.description, None);
        assert_eq!(payload.assignee_id, None);
    }

    #[test]
    fn task_update_requires_status_and_priority() {
        let result = serde_json::from_str::<TaskUpdate>(r#"{"title":"Ship","author_id":1}"#);
        assert!(result.is_err());
    }
}
