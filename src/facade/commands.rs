//! Inbound command records. The transport fills in `username` from the
//! authenticated principal on every owner-scoped command.

use std::fmt;

use crate::models::{TaskPriority, TaskStatus, UserStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTask {
    pub content: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTaskContent {
    pub task_id: i64,
    pub new_content: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTaskPriority {
    pub task_id: i64,
    pub new_priority: TaskPriority,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTaskStatus {
    pub task_id: i64,
    pub new_status: TaskStatus,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveTask {
    pub task_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAllTasks {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTaskByOwnerAndId {
    pub username: String,
    pub task_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTasks {
    pub username: String,
    /// File name without directory or extension.
    pub file_name: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ChangeUserPassword {
    pub username: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeUserStatus {
    pub username: String,
    pub new_status: UserStatus,
}

// Commands are logged; keep plain-text passwords out of the output.
impl fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegisterUser")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Debug for ChangeUserPassword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChangeUserPassword")
            .field("username", &self.username)
            .field("new_password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_commands_do_not_leak_passwords() {
        let command = RegisterUser {
            username: "alice".into(),
            password: "hunter22".into(),
        };
        let rendered = format!("{:?}", command);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter22"));

        let command = ChangeUserPassword {
            username: "alice".into(),
            new_password: "hunter33".into(),
        };
        assert!(!format!("{:?}", command).contains("hunter33"));
    }
}
