use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::error::TaskError;
use crate::models::now_millis;

/// Longest task content accepted, in characters.
pub const MAX_TASK_CONTENT_LENGTH: usize = 1000;

/// Represents the priority of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Represents the status of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// Task is still open.
    Undone,
    /// Task is completed.
    Done,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            other => Err(format!("unknown task priority: {}", other)),
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Undone => "UNDONE",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "UNDONE" => Ok(TaskStatus::Undone),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Read-only projection of a task handed to callers outside the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Option<i64>,
    pub content: String,
    pub priority: String,
    pub status: String,
    pub creation_date: String,
}

/// A task owned by a single user.
///
/// Tasks are immutable values: every transition returns a new `Task` that
/// carries the id, uuid, creation date and owner of the original forward.
/// Two tasks are equal when their uuids are equal, whatever their other fields.
#[derive(Debug, Clone)]
pub struct Task {
    id: Option<i64>,
    uuid: Uuid,
    content: String,
    priority: TaskPriority,
    status: TaskStatus,
    creation_date: DateTime<Utc>,
    owner_username: String,
}

impl Task {
    /// Validates `content` and builds a new, not yet persisted task.
    pub fn create(
        content: &str,
        priority: TaskPriority,
        status: TaskStatus,
        owner_username: &str,
    ) -> Result<Self, TaskError> {
        let content = validate_content(content)?;
        Ok(Self {
            id: None,
            uuid: Uuid::new_v4(),
            content,
            priority,
            status,
            creation_date: now_millis(),
            owner_username: owner_username.to_string(),
        })
    }

    /// Rebuilds a task from its stored form.
    pub(crate) fn restore(
        id: i64,
        uuid: Uuid,
        content: String,
        priority: TaskPriority,
        status: TaskStatus,
        creation_date: DateTime<Utc>,
        owner_username: String,
    ) -> Self {
        Self {
            id: Some(id),
            uuid,
            content,
            priority,
            status,
            creation_date,
            owner_username,
        }
    }

    pub(crate) fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    pub fn change_content(&self, content: &str) -> Result<Self, TaskError> {
        let content = validate_content(content)?;
        Ok(Self {
            content,
            ..self.clone()
        })
    }

    pub fn change_priority(&self, priority: TaskPriority) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    pub fn change_status(&self, status: TaskStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn to_view(&self) -> TaskView {
        TaskView {
            id: self.id,
            content: self.content.clone(),
            priority: self.priority.to_string(),
            status: self.status.to_string(),
            creation_date: self
                .creation_date
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn owner_username(&self) -> &str {
        &self.owner_username
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner_username == username
    }
}

fn validate_content(candidate: &str) -> Result<String, TaskError> {
    if candidate.chars().count() > MAX_TASK_CONTENT_LENGTH {
        Err(TaskError::wrong_content_length(candidate))
    } else {
        Ok(candidate.to_string())
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// Textual form written by the task export.
impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "null".to_string());
        write!(
            f,
            "Task(uuid={}, id={}, content={}, priority={}, status={}, creationDate={}, ownerUsername={})",
            self.uuid,
            id,
            self.content,
            self.priority,
            self.status,
            self.creation_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.owner_username
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_creation() {
        let task = Task::create("hello", TaskPriority::Low, TaskStatus::Undone, "alice").unwrap();
        assert_eq!(task.content(), "hello");
        assert_eq!(task.owner_username(), "alice");
        assert!(task.id().is_none());

        let view = task.to_view();
        assert_eq!(view.content, "hello");
        assert_eq!(view.priority, "LOW");
        assert_eq!(view.status, "UNDONE");
    }

    #[test]
    fn test_content_length_limit() {
        let at_limit = "c".repeat(MAX_TASK_CONTENT_LENGTH);
        let task = Task::create(&at_limit, TaskPriority::High, TaskStatus::Done, "alice").unwrap();
        assert_eq!(task.content(), at_limit);

        let too_long = "c".repeat(MAX_TASK_CONTENT_LENGTH + 1);
        let error = Task::create(&too_long, TaskPriority::High, TaskStatus::Done, "alice").unwrap_err();
        assert_eq!(
            error,
            TaskError::WrongTaskContentLength {
                length: 1001,
                max: 1000
            }
        );
    }

    #[test]
    fn test_content_length_counts_characters() {
        let wide = "ż".repeat(MAX_TASK_CONTENT_LENGTH);
        assert!(Task::create(&wide, TaskPriority::Low, TaskStatus::Undone, "alice").is_ok());
    }

    #[test]
    fn test_creation_date_is_truncated_to_millis() {
        let task = Task::create("hello", TaskPriority::Low, TaskStatus::Undone, "alice").unwrap();
        assert_eq!(task.creation_date().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_change_content_keeps_identity() {
        let task = Task::create("hello", TaskPriority::Medium, TaskStatus::Undone, "alice")
            .unwrap()
            .with_id(7);
        let changed = task.change_content("goodbye").unwrap();

        assert_eq!(changed.content(), "goodbye");
        assert_eq!(changed.id(), Some(7));
        assert_eq!(changed.uuid(), task.uuid());
        assert_eq!(changed.creation_date(), task.creation_date());
        assert_eq!(changed.priority(), TaskPriority::Medium);
        assert_eq!(task.content(), "hello");

        let rejected = task.change_content(&"x".repeat(1001));
        assert!(matches!(
            rejected,
            Err(TaskError::WrongTaskContentLength { length: 1001, .. })
        ));
    }

    #[test]
    fn test_status_change_is_idempotent() {
        let task = Task::create("hello", TaskPriority::Low, TaskStatus::Undone, "alice").unwrap();
        let once = task.change_status(TaskStatus::Done);
        let twice = once.change_status(TaskStatus::Done);

        assert_eq!(once, twice);
        assert_eq!(twice.status(), TaskStatus::Done);
        assert_eq!(once.to_view(), twice.to_view());
    }

    #[test]
    fn test_equality_is_by_uuid() {
        let task = Task::create("hello", TaskPriority::Low, TaskStatus::Undone, "alice").unwrap();
        let other = Task::create("hello", TaskPriority::Low, TaskStatus::Undone, "alice").unwrap();

        assert_eq!(task, task.change_priority(TaskPriority::High));
        assert_ne!(task, other);
    }

    #[test]
    fn test_enum_names_round_trip_through_strings() {
        assert_eq!("MEDIUM".parse::<TaskPriority>(), Ok(TaskPriority::Medium));
        assert_eq!("DONE".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("done".parse::<TaskStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&TaskPriority::High).unwrap(),
            "\"HIGH\""
        );
    }

    #[test]
    fn test_display_contains_fields() {
        let task = Task::create("buy milk", TaskPriority::Low, TaskStatus::Undone, "alice")
            .unwrap()
            .with_id(3);
        let text = task.to_string();
        assert!(text.starts_with("Task(uuid="));
        assert!(text.contains("id=3"));
        assert!(text.contains("content=buy milk"));
        assert!(text.contains("ownerUsername=alice"));
    }
}
