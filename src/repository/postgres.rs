//! Postgres-backed repositories.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database. Rows are decoded into private row structs and then
//! converted into aggregates, so a bad enum name in the table surfaces as
//! [`RepositoryError::Corrupted`] instead of a panic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{RepositoryError, Task, User};
use crate::repository::{StorageTransaction, TaskRepository, UnitOfWork, UserRepository};

const TASK_COLUMNS: &str = "id, uuid, content, priority, status, creation_date, owner_username";
const USER_COLUMNS: &str = "username, uuid, password, role, status, creation_date";

/// Applies the schema in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RepositoryError::Storage(format!("Failed to run migrations: {}", e)))
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    uuid: Uuid,
    content: String,
    priority: String,
    status: String,
    creation_date: DateTime<Utc>,
    owner_username: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task::restore(
            row.id,
            row.uuid,
            row.content,
            row.priority.parse().map_err(RepositoryError::Corrupted)?,
            row.status.parse().map_err(RepositoryError::Corrupted)?,
            row.creation_date,
            row.owner_username,
        ))
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    uuid: Uuid,
    password: String,
    role: String,
    status: String,
    creation_date: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::restore(
            row.uuid,
            row.username,
            row.password,
            row.role.parse().map_err(RepositoryError::Corrupted)?,
            row.status.parse().map_err(RepositoryError::Corrupted)?,
            row.creation_date,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn add(&self, task: Task) -> Result<Task, RepositoryError> {
        let row = match task.id() {
            None => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "INSERT INTO tasks (uuid, content, priority, status, creation_date, owner_username)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING {}",
                    TASK_COLUMNS
                ))
                .bind(task.uuid())
                .bind(task.content())
                .bind(task.priority().as_str())
                .bind(task.status().as_str())
                .bind(task.creation_date())
                .bind(task.owner_username())
                .fetch_one(&self.pool)
                .await?
            }
            // Tasks that already carry an id are upserted by it.
            Some(id) => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "INSERT INTO tasks (id, uuid, content, priority, status, creation_date, owner_username)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (id) DO UPDATE
                     SET content = EXCLUDED.content, priority = EXCLUDED.priority, status = EXCLUDED.status
                     RETURNING {}",
                    TASK_COLUMNS
                ))
                .bind(id)
                .bind(task.uuid())
                .bind(task.content())
                .bind(task.priority().as_str())
                .bind(task.status().as_str())
                .bind(task.creation_date())
                .bind(task.owner_username())
                .fetch_one(&self.pool)
                .await?
            }
        };
        log::debug!("stored task {} of {}", row.id, row.owner_username);
        row.try_into()
    }

    async fn remove(&self, task: &Task) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tasks WHERE uuid = $1")
            .bind(task.uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_all(&self, owner_username: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_username = $1")
            .bind(owner_username)
            .execute(&self.pool)
            .await?;
        log::debug!(
            "removed {} tasks of {}",
            result.rows_affected(),
            owner_username
        );
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::try_from)
        .transpose()
    }

    async fn get_by_owner_and_id(
        &self,
        owner_username: &str,
        id: i64,
    ) -> Result<Option<Task>, RepositoryError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE owner_username = $1 AND id = $2",
            TASK_COLUMNS
        ))
        .bind(owner_username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Task::try_from)
        .transpose()
    }

    async fn get_all_by_owner(&self, owner_username: &str) -> Result<Vec<Task>, RepositoryError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE owner_username = $1 ORDER BY id",
            TASK_COLUMNS
        ))
        .bind(owner_username)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Task::try_from)
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn add(&self, user: User) -> Result<User, RepositoryError> {
        // The primary key on username is what actually guarantees uniqueness:
        // the update only applies to the same user (same uuid), anything else
        // returns no row.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, uuid, password, role, status, creation_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (username) DO UPDATE
             SET password = EXCLUDED.password, role = EXCLUDED.role, status = EXCLUDED.status
             WHERE users.uuid = EXCLUDED.uuid
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.username())
        .bind(user.uuid())
        .bind(user.password())
        .bind(user.role().as_str())
        .bind(user.status().as_str())
        .bind(user.creation_date())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                log::debug!("stored user {}", row.username);
                row.try_into()
            }
            None => Err(RepositoryError::Conflict(format!(
                "username {} is taken",
                user.username()
            ))),
        }
    }

    async fn remove(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(user.username())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_all(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    async fn get_all(&self) -> Result<Vec<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }
}

/// Opens database transactions on the shared pool.
#[derive(Debug, Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(format!("Failed to begin transaction: {}", e)))?;
        Ok(Box::new(PgStorageTransaction { tx: Some(tx) }))
    }
}

/// Rolled back by sqlx when dropped before `commit`.
struct PgStorageTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStorageTransaction {
    fn open(&mut self) -> Result<&mut Transaction<'static, Postgres>, RepositoryError> {
        self.tx
            .as_mut()
            .ok_or_else(|| RepositoryError::Storage("transaction already committed".to_string()))
    }
}

#[async_trait]
impl StorageTransaction for PgStorageTransaction {
    async fn remove_all_tasks(&mut self, owner_username: &str) -> Result<u64, RepositoryError> {
        let tx = self.open()?;
        let result = sqlx::query("DELETE FROM tasks WHERE owner_username = $1")
            .bind(owner_username)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        let tx = self.open()?;
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(user.username())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        match self.tx.take() {
            Some(tx) => tx
                .commit()
                .await
                .map_err(|e| RepositoryError::Storage(format!("Failed to commit transaction: {}", e))),
            None => Err(RepositoryError::Storage(
                "transaction already committed".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus, UserRole, UserStatus};

    #[test]
    fn test_task_row_conversion() {
        let row = TaskRow {
            id: 5,
            uuid: Uuid::new_v4(),
            content: "hello".into(),
            priority: "HIGH".into(),
            status: "DONE".into(),
            creation_date: Utc::now(),
            owner_username: "alice".into(),
        };
        let task = Task::try_from(row).unwrap();
        assert_eq!(task.id(), Some(5));
        assert_eq!(task.priority(), TaskPriority::High);
        assert_eq!(task.status(), TaskStatus::Done);
    }

    #[test]
    fn test_corrupted_rows_are_reported() {
        let row = UserRow {
            username: "alice".into(),
            uuid: Uuid::new_v4(),
            password: "hash".into(),
            role: "SUPERUSER".into(),
            status: "OPEN".into(),
            creation_date: Utc::now(),
        };
        assert!(matches!(
            User::try_from(row),
            Err(RepositoryError::Corrupted(_))
        ));

        let row = UserRow {
            username: "alice".into(),
            uuid: Uuid::new_v4(),
            password: "hash".into(),
            role: "ADMIN".into(),
            status: "BANNED".into(),
            creation_date: Utc::now(),
        };
        let user = User::try_from(row).unwrap();
        assert_eq!(user.role(), UserRole::Admin);
        assert_eq!(user.status(), UserStatus::Banned);
    }
}
