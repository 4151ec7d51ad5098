pub mod error;
pub mod task;
pub mod user;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

pub use error::{RepositoryError, TaskError, UserError};
pub use task::{Task, TaskPriority, TaskStatus, TaskView, MAX_TASK_CONTENT_LENGTH};
pub use user::{
    User, UserAuthView, UserRole, UserStatus, UserView, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH,
    MIN_USERNAME_LENGTH,
};

/// Current time with everything below the millisecond dropped.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(now)
}
