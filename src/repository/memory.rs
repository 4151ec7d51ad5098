use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::models::{RepositoryError, Task, User};
use crate::repository::{StorageTransaction, TaskRepository, UnitOfWork, UserRepository};

#[derive(Debug, Default)]
struct TaskTable {
    rows: BTreeMap<i64, Task>,
    last_id: i64,
}

/// Task storage kept in process memory. Ids are assigned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    table: Arc<RwLock<TaskTable>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn add(&self, task: Task) -> Result<Task, RepositoryError> {
        let mut table = self.table.write().await;
        let id = match task.id() {
            Some(id) => {
                table.last_id = table.last_id.max(id);
                id
            }
            None => {
                table.last_id += 1;
                table.last_id
            }
        };
        let task = task.with_id(id);
        table.rows.insert(id, task.clone());
        log::debug!("stored task {} of {}", id, task.owner_username());
        Ok(task)
    }

    async fn remove(&self, task: &Task) -> Result<(), RepositoryError> {
        if let Some(id) = task.id() {
            self.table.write().await.rows.remove(&id);
        }
        Ok(())
    }

    async fn remove_all(&self, owner_username: &str) -> Result<(), RepositoryError> {
        self.table
            .write()
            .await
            .rows
            .retain(|_, task| !task.is_owned_by(owner_username));
        log::debug!("removed all tasks of {}", owner_username);
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn get_by_owner_and_id(
        &self,
        owner_username: &str,
        id: i64,
    ) -> Result<Option<Task>, RepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .get(&id)
            .filter(|task| task.is_owned_by(owner_username))
            .cloned())
    }

    async fn get_all_by_owner(&self, owner_username: &str) -> Result<Vec<Task>, RepositoryError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|task| task.is_owned_by(owner_username))
            .cloned()
            .collect())
    }
}

/// User storage kept in process memory, keyed by username.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn add(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(user.username()) {
            if existing.uuid() != user.uuid() {
                return Err(RepositoryError::Conflict(format!(
                    "username {} is taken",
                    user.username()
                )));
            }
        }
        users.insert(user.username().to_string(), user.clone());
        log::debug!("stored user {}", user.username());
        Ok(user)
    }

    async fn remove(&self, user: &User) -> Result<(), RepositoryError> {
        self.users.write().await.remove(user.username());
        Ok(())
    }

    async fn remove_all(&self) -> Result<(), RepositoryError> {
        self.users.write().await.clear();
        Ok(())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.users.read().await.contains_key(username))
    }

    async fn get_all(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

/// Transactions over a pair of in-memory repositories.
///
/// A transaction holds the write locks of both tables from `begin` until it is
/// committed or dropped, so nothing can interleave with it. Locks are always
/// taken users first, then tasks.
#[derive(Debug, Clone)]
pub struct InMemoryUnitOfWork {
    tasks: Arc<RwLock<TaskTable>>,
    users: Arc<RwLock<BTreeMap<String, User>>>,
}

impl InMemoryUnitOfWork {
    pub fn new(tasks: &InMemoryTaskRepository, users: &InMemoryUserRepository) -> Self {
        Self {
            tasks: tasks.table.clone(),
            users: users.users.clone(),
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, RepositoryError> {
        let users = self.users.clone().write_owned().await;
        let tasks = self.tasks.clone().write_owned().await;
        Ok(Box::new(InMemoryTransaction {
            users,
            tasks,
            staged: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum StagedWrite {
    RemoveAllTasks(String),
    RemoveUser(String),
}

struct InMemoryTransaction {
    users: OwnedRwLockWriteGuard<BTreeMap<String, User>>,
    tasks: OwnedRwLockWriteGuard<TaskTable>,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl StorageTransaction for InMemoryTransaction {
    async fn remove_all_tasks(&mut self, owner_username: &str) -> Result<u64, RepositoryError> {
        let count = self
            .tasks
            .rows
            .values()
            .filter(|task| task.is_owned_by(owner_username))
            .count();
        self.staged
            .push(StagedWrite::RemoveAllTasks(owner_username.to_string()));
        Ok(count as u64)
    }

    async fn remove_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        self.staged
            .push(StagedWrite::RemoveUser(user.username().to_string()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        for write in self.staged.drain(..) {
            match write {
                StagedWrite::RemoveAllTasks(owner) => {
                    self.tasks.rows.retain(|_, task| !task.is_owned_by(&owner))
                }
                StagedWrite::RemoveUser(username) => {
                    self.users.remove(&username);
                }
            }
        }
        log::debug!("committed in-memory transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus, UserRole};
    use pretty_assertions::assert_eq;

    fn task(owner: &str) -> Task {
        Task::create("content", TaskPriority::Low, TaskStatus::Undone, owner).unwrap()
    }

    #[tokio::test]
    async fn test_task_add_assigns_ids_and_upserts() {
        let repo = InMemoryTaskRepository::new();

        let first = repo.add(task("alice")).await.unwrap();
        let second = repo.add(task("alice")).await.unwrap();
        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));

        let changed = first.change_content("edited").unwrap();
        let stored = repo.add(changed).await.unwrap();
        assert_eq!(stored.id(), Some(1));
        assert_eq!(repo.get_by_id(1).await.unwrap().unwrap().content(), "edited");
        assert_eq!(repo.get_all_by_owner("alice").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_task_queries_are_owner_scoped() {
        let repo = InMemoryTaskRepository::new();
        let alice_task = repo.add(task("alice")).await.unwrap();
        repo.add(task("bobby")).await.unwrap();

        let id = alice_task.id().unwrap();
        assert!(repo.get_by_owner_and_id("alice", id).await.unwrap().is_some());
        assert!(repo.get_by_owner_and_id("bobby", id).await.unwrap().is_none());

        repo.remove_all("alice").await.unwrap();
        assert!(repo.get_all_by_owner("alice").await.unwrap().is_empty());
        assert_eq!(repo.get_all_by_owner("bobby").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_add_refuses_foreign_overwrite() {
        let repo = InMemoryUserRepository::new();
        let alice = User::create("alice", "secret", UserRole::Common).unwrap();
        repo.add(alice.clone()).await.unwrap();

        let impostor = User::create("alice", "other-secret", UserRole::Common).unwrap();
        assert!(matches!(
            repo.add(impostor).await,
            Err(RepositoryError::Conflict(_))
        ));

        let banned = alice.change_status(crate::models::UserStatus::Banned);
        repo.add(banned).await.unwrap();
        let stored = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.status(), crate::models::UserStatus::Banned);
        assert_eq!(stored.password(), "secret");
    }

    async fn seeded() -> (InMemoryTaskRepository, InMemoryUserRepository, InMemoryUnitOfWork) {
        let tasks = InMemoryTaskRepository::new();
        let users = InMemoryUserRepository::new();
        users
            .add(User::create("alice", "secret", UserRole::Common).unwrap())
            .await
            .unwrap();
        tasks.add(task("alice")).await.unwrap();
        tasks.add(task("alice")).await.unwrap();
        tasks.add(task("bobby")).await.unwrap();
        let unit_of_work = InMemoryUnitOfWork::new(&tasks, &users);
        (tasks, users, unit_of_work)
    }

    #[tokio::test]
    async fn test_transaction_applies_writes_on_commit() {
        let (tasks, users, unit_of_work) = seeded().await;
        let alice = users.get_by_username("alice").await.unwrap().unwrap();

        let mut tx = unit_of_work.begin().await.unwrap();
        assert_eq!(tx.remove_all_tasks("alice").await.unwrap(), 2);
        tx.remove_user(&alice).await.unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        assert!(tasks.get_all_by_owner("alice").await.unwrap().is_empty());
        assert_eq!(tasks.get_all_by_owner("bobby").await.unwrap().len(), 1);
        assert!(!users.exists_by_username("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_transaction_changes_nothing() {
        let (tasks, users, unit_of_work) = seeded().await;
        let alice = users.get_by_username("alice").await.unwrap().unwrap();

        let mut tx = unit_of_work.begin().await.unwrap();
        tx.remove_all_tasks("alice").await.unwrap();
        tx.remove_user(&alice).await.unwrap();
        drop(tx);

        assert_eq!(tasks.get_all_by_owner("alice").await.unwrap().len(), 2);
        assert!(users.exists_by_username("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_writers_wait_for_open_transaction() {
        let (tasks, _users, unit_of_work) = seeded().await;

        let mut tx = unit_of_work.begin().await.unwrap();
        tx.remove_all_tasks("alice").await.unwrap();

        let writer = {
            let tasks = tasks.clone();
            tokio::spawn(async move { tasks.add(task("alice")).await })
        };
        tokio::task::yield_now().await;
        assert!(!writer.is_finished());

        tx.commit().await.unwrap();
        drop(tx);

        // The task created after the commit survives it.
        writer.await.unwrap().unwrap();
        assert_eq!(tasks.get_all_by_owner("alice").await.unwrap().len(), 1);
    }
}
