use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::password::PasswordEncoder;
use crate::facade::commands::{ChangeUserPassword, ChangeUserStatus, RegisterUser};
use crate::facade::factory::UserFactory;
use crate::models::{TaskError, User, UserAuthView, UserError, UserRole, UserView};
use crate::repository::{StorageTransaction, UnitOfWork, UserRepository};

/// The task side of a user removal.
///
/// Implemented by [`crate::facade::TaskFacade`]; kept behind a trait so the
/// user facade can be exercised against a collaborator that fails.
#[async_trait]
pub trait TaskCascade: Send + Sync {
    /// Removes every task owned by `username` as part of `tx`. Returns how
    /// many tasks go with the user once `tx` commits.
    async fn remove_all_tasks_in(
        &self,
        tx: &mut dyn StorageTransaction,
        username: &str,
    ) -> Result<u64, TaskError>;
}

/// Command handlers over the user aggregate, including the user → tasks cascade.
pub struct UserFacade {
    repository: Arc<dyn UserRepository>,
    encoder: Arc<dyn PasswordEncoder>,
    factory: UserFactory,
    tasks: Arc<dyn TaskCascade>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl UserFacade {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        encoder: Arc<dyn PasswordEncoder>,
        tasks: Arc<dyn TaskCascade>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        let factory = UserFactory::new(encoder.clone(), repository.clone());
        Self {
            repository,
            encoder,
            factory,
            tasks,
            unit_of_work,
        }
    }

    pub async fn register_user(&self, command: RegisterUser) -> Result<UserView, UserError> {
        log::info!("{:?}", command);
        let view = self
            .factory
            .create(&command.username, &command.password, UserRole::Common)
            .await?;
        log::info!("registered {}", view.username);
        Ok(view)
    }

    /// Registers the configured main administrator. Returns `None` when an
    /// account with that username already exists.
    pub async fn register_main_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserView>, UserError> {
        match self.factory.create(username, password, UserRole::Admin).await {
            Ok(view) => {
                log::info!("Main Admin added.");
                Ok(Some(view))
            }
            Err(UserError::NotUniqueUserName) => {
                log::info!("Main Admin already exists");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn change_user_password(
        &self,
        command: ChangeUserPassword,
    ) -> Result<UserView, UserError> {
        log::info!("{:?}", command);
        let user = self.load(&command.username).await?;
        let changed = user.change_password(&command.new_password, self.encoder.as_ref())?;
        Ok(self.repository.add(changed).await?.to_view())
    }

    pub async fn change_user_status(
        &self,
        command: ChangeUserStatus,
    ) -> Result<UserView, UserError> {
        log::info!("{:?}", command);
        let user = self.load(&command.username).await?;
        let changed = user.change_status(command.new_status);
        Ok(self.repository.add(changed).await?.to_view())
    }

    /// Removes the user together with all of their tasks, or neither.
    ///
    /// Both removals run in one storage transaction; any failure before the
    /// commit leaves the user and their tasks as they were.
    pub async fn remove_user_by_username(&self, username: &str) -> Result<UserView, UserError> {
        log::info!("removing user {}", username);
        let user = self.load(username).await?;

        let mut tx = self.unit_of_work.begin().await?;
        let removed_tasks = self
            .tasks
            .remove_all_tasks_in(&mut *tx, username)
            .await
            .map_err(UserError::TaskCascade)?;
        tx.remove_user(&user).await?;
        tx.commit().await?;

        log::info!("removed user {} and {} tasks", username, removed_tasks);
        Ok(user.to_view())
    }

    pub async fn read_all_users(&self) -> Result<Vec<UserView>, UserError> {
        let users = self.repository.get_all().await?;
        Ok(users.iter().map(User::to_view).collect())
    }

    pub async fn read_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserView>, UserError> {
        let user = self.repository.get_by_username(username).await?;
        Ok(user.as_ref().map(User::to_view))
    }

    pub async fn remove_all_users(&self) -> Result<(), UserError> {
        log::warn!("removing all users");
        self.repository.remove_all().await?;
        Ok(())
    }

    pub async fn get_user_auth(&self, username: &str) -> Result<Option<UserAuthView>, UserError> {
        let user = self.repository.get_by_username(username).await?;
        Ok(user.as_ref().map(User::to_auth))
    }

    /// Returns the auth projection when `password` matches the stored hash.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserAuthView>, UserError> {
        match self.get_user_auth(username).await? {
            Some(auth) if self.encoder.matches(password, &auth.password)? => Ok(Some(auth)),
            _ => Ok(None),
        }
    }

    async fn load(&self, username: &str) -> Result<User, UserError> {
        self.repository
            .get_by_username(username)
            .await?
            .ok_or_else(|| UserError::UserNotFound(username.to_string()))
    }
}
