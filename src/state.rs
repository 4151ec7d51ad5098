//! Wiring of repositories, facades and the token service.

use actix_web::web;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{BcryptPasswordEncoder, PasswordEncoder, TokenService};
use crate::config::Config;
use crate::facade::{TaskCascade, TaskFacade, UserFacade};
use crate::models::RepositoryError;
use crate::repository::{
    postgres, InMemoryTaskRepository, InMemoryUnitOfWork, InMemoryUserRepository,
    PgTaskRepository, PgUnitOfWork, PgUserRepository, TaskRepository, UnitOfWork,
    UserRepository,
};

/// Everything the HTTP handlers share, built once and cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    tasks: Arc<TaskFacade>,
    users: Arc<UserFacade>,
    tokens: TokenService,
}

impl AppState {
    pub fn new(
        task_repository: Arc<dyn TaskRepository>,
        user_repository: Arc<dyn UserRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        encoder: Arc<dyn PasswordEncoder>,
        config: &Config,
    ) -> Self {
        let tasks = Arc::new(TaskFacade::new(task_repository, config.export_dir.clone()));
        let cascade: Arc<dyn TaskCascade> = tasks.clone();
        let users = Arc::new(UserFacade::new(
            user_repository,
            encoder,
            cascade,
            unit_of_work,
        ));
        Self {
            tasks,
            users,
            tokens: TokenService::new(&config.jwt_secret, config.jwt_expiration_hours),
        }
    }

    pub fn in_memory(config: &Config) -> Self {
        log::info!("using in-memory storage");
        let tasks = InMemoryTaskRepository::new();
        let users = InMemoryUserRepository::new();
        let unit_of_work = InMemoryUnitOfWork::new(&tasks, &users);
        Self::new(
            Arc::new(tasks),
            Arc::new(users),
            Arc::new(unit_of_work),
            Arc::new(BcryptPasswordEncoder::new(config.bcrypt_cost)),
            config,
        )
    }

    /// Runs pending migrations, then builds the state over Postgres.
    pub async fn postgres(pool: PgPool, config: &Config) -> Result<Self, RepositoryError> {
        postgres::run_migrations(&pool).await?;
        log::info!("using postgres storage");
        Ok(Self::new(
            Arc::new(PgTaskRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgUnitOfWork::new(pool)),
            Arc::new(BcryptPasswordEncoder::new(config.bcrypt_cost)),
            config,
        ))
    }

    pub fn tasks(&self) -> &TaskFacade {
        &self.tasks
    }

    pub fn users(&self) -> &UserFacade {
        &self.users
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Registers the facades and token service as app data.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.tasks.clone()))
            .app_data(web::Data::from(self.users.clone()))
            .app_data(web::Data::new(self.tokens.clone()));
    }
}
