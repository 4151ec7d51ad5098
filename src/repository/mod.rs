//! Storage contracts the facades depend on, and the backends implementing them.
//!
//! Facades only ever see `Arc<dyn TaskRepository>` / `Arc<dyn UserRepository>`.
//! Absence is reported as `Ok(None)`; `Err` is reserved for storage failures.
//! Writes that must land together across both tables go through a
//! [`UnitOfWork`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{RepositoryError, Task, User};

pub use memory::{InMemoryTaskRepository, InMemoryUnitOfWork, InMemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUnitOfWork, PgUserRepository};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task without an id, or replaces the stored task with the same id.
    /// Returns the stored form, id populated.
    async fn add(&self, task: Task) -> Result<Task, RepositoryError>;

    async fn remove(&self, task: &Task) -> Result<(), RepositoryError>;

    /// Removes every task owned by `owner_username`.
    async fn remove_all(&self, owner_username: &str) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError>;

    async fn get_by_owner_and_id(
        &self,
        owner_username: &str,
        id: i64,
    ) -> Result<Option<Task>, RepositoryError>;

    async fn get_all_by_owner(&self, owner_username: &str) -> Result<Vec<Task>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts or replaces the user stored under the same username.
    ///
    /// Fails with [`RepositoryError::Conflict`] when that username already
    /// belongs to a different user (a different uuid).
    async fn add(&self, user: User) -> Result<User, RepositoryError>;

    async fn remove(&self, user: &User) -> Result<(), RepositoryError>;

    async fn remove_all(&self) -> Result<(), RepositoryError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError>;

    async fn get_all(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Opens all-or-nothing transactions spanning the task and user tables.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, RepositoryError>;
}

/// Writes issued through a transaction become visible together on
/// [`StorageTransaction::commit`]. Dropping it uncommitted discards them.
#[async_trait]
pub trait StorageTransaction: Send {
    /// Removes every task owned by `owner_username`, returning how many there were.
    async fn remove_all_tasks(&mut self, owner_username: &str) -> Result<u64, RepositoryError>;

    async fn remove_user(&mut self, user: &User) -> Result<(), RepositoryError>;

    async fn commit(&mut self) -> Result<(), RepositoryError>;
}
