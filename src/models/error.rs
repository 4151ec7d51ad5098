//! Domain failures returned by aggregates, repositories and facades.
//!
//! Every fallible domain operation returns one of these as the `Err` side of a
//! `Result`. Nothing in the domain layer panics on bad input.

use thiserror::Error;

use crate::models::task::MAX_TASK_CONTENT_LENGTH;
use crate::models::user::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH};

/// Failures raised by a storage backend behind a repository contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The backend could not execute the operation.
    #[error("Storage error: {0}")]
    Storage(String),
    /// A write collided with a different record stored under the same key.
    #[error("Conflicting write: {0}")]
    Conflict(String),
    /// A stored record could not be decoded back into an aggregate.
    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        RepositoryError::Storage(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Wrong task content length: {length} Max: {max}")]
    WrongTaskContentLength { length: usize, max: usize },

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// A username or file name that cannot be used as a path component.
    #[error("Invalid export file name: {0}")]
    InvalidExportName(String),

    #[error("Could not export tasks: {0}")]
    Export(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl TaskError {
    pub(crate) fn wrong_content_length(content: &str) -> Self {
        TaskError::WrongTaskContentLength {
            length: content.chars().count(),
            max: MAX_TASK_CONTENT_LENGTH,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::TaskNotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Wrong username length: {length}.Min: {min},max: {max}", min = MIN_USERNAME_LENGTH, max = MAX_USERNAME_LENGTH)]
    WrongUsernameLength { length: usize },

    #[error("Wrong password length: {length}.Min: {min}", min = MIN_PASSWORD_LENGTH)]
    WrongPasswordLength { length: usize },

    #[error("Not unique username.")]
    NotUniqueUserName,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Failed to encode password: {0}")]
    PasswordEncoding(String),

    /// The task removal step of a user removal failed; the user was left in place.
    #[error("Failed to remove tasks of user: {0}")]
    TaskCascade(TaskError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl UserError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::UserNotFound(_))
    }
}
