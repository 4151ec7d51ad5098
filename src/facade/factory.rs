use std::sync::Arc;

use crate::auth::password::PasswordEncoder;
use crate::models::{RepositoryError, User, UserError, UserRole, UserView};
use crate::repository::UserRepository;

/// The only way a new user enters storage.
///
/// The uniqueness check here is a fast path; the repository's own conflict
/// detection is what holds when two registrations race for one username.
pub struct UserFactory {
    encoder: Arc<dyn PasswordEncoder>,
    repository: Arc<dyn UserRepository>,
}

impl UserFactory {
    pub fn new(encoder: Arc<dyn PasswordEncoder>, repository: Arc<dyn UserRepository>) -> Self {
        Self {
            encoder,
            repository,
        }
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<UserView, UserError> {
        let user = User::create(username, password, role)?;
        if !user.is_username_unique(self.repository.as_ref()).await? {
            return Err(UserError::NotUniqueUserName);
        }
        let user = user.encode_password(self.encoder.as_ref())?;
        let stored = self.repository.add(user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::NotUniqueUserName,
            other => other.into(),
        })?;
        Ok(stored.to_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::BcryptPasswordEncoder;
    use crate::repository::InMemoryUserRepository;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn factory(repository: Arc<dyn UserRepository>) -> UserFactory {
        UserFactory::new(Arc::new(BcryptPasswordEncoder::new(4)), repository)
    }

    #[tokio::test]
    async fn test_create_hashes_and_stores() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let view = factory(repository.clone())
            .create("alice", "secret", UserRole::Common)
            .await
            .unwrap();

        assert_eq!(view.username, "alice");
        assert_eq!(view.role, "COMMON");
        assert_ne!(view.password, "secret");
        assert!(repository.exists_by_username("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_fails_before_storage() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let error = factory(repository.clone())
            .create("al", "secret", UserRole::Common)
            .await
            .unwrap_err();

        assert_eq!(error, UserError::WrongUsernameLength { length: 2 });
        assert!(repository.get_all().await.unwrap().is_empty());
    }

    /// Claims every username is free, as a racing registration would see it.
    struct StaleExistsRepository(InMemoryUserRepository);

    #[async_trait]
    impl UserRepository for StaleExistsRepository {
        async fn add(&self, user: User) -> Result<User, RepositoryError> {
            self.0.add(user).await
        }
        async fn remove(&self, user: &User) -> Result<(), RepositoryError> {
            self.0.remove(user).await
        }
        async fn remove_all(&self) -> Result<(), RepositoryError> {
            self.0.remove_all().await
        }
        async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
            self.0.get_by_username(username).await
        }
        async fn exists_by_username(&self, _username: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }
        async fn get_all(&self) -> Result<Vec<User>, RepositoryError> {
            self.0.get_all().await
        }
    }

    #[tokio::test]
    async fn test_storage_conflict_reports_not_unique() {
        let repository = Arc::new(StaleExistsRepository(InMemoryUserRepository::new()));
        let factory = factory(repository.clone());

        let first = factory.create("alice", "secret", UserRole::Common).await.unwrap();
        let second = factory.create("alice", "another", UserRole::Common).await;

        assert_eq!(second.unwrap_err(), UserError::NotUniqueUserName);
        let stored = repository.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.password(), first.password);
    }
}
