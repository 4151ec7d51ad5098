use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::facade::commands::{
    ChangeTaskContent, ChangeTaskPriority, ChangeTaskStatus, CreateTask, ExportTasks,
    ReadAllTasks, ReadTaskByOwnerAndId, RemoveTask,
};
use crate::facade::users::TaskCascade;
use crate::models::{Task, TaskError, TaskView};
use crate::repository::{StorageTransaction, TaskRepository};

/// Command handlers over the task aggregate.
///
/// Every mutating command loads the task by id, applies the transition and
/// persists the result. A task owned by someone other than the command's
/// `username` is reported exactly like a missing one.
pub struct TaskFacade {
    repository: Arc<dyn TaskRepository>,
    export_dir: PathBuf,
}

impl TaskFacade {
    pub fn new(repository: Arc<dyn TaskRepository>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            export_dir: export_dir.into(),
        }
    }

    pub async fn create_task(&self, command: CreateTask) -> Result<TaskView, TaskError> {
        log::info!("{:?}", command);
        let task = Task::create(
            &command.content,
            command.priority,
            command.status,
            &command.username,
        )?;
        let view = self.repository.add(task).await?.to_view();
        log::info!("created task {:?} for {}", view.id, command.username);
        Ok(view)
    }

    pub async fn change_task_content(
        &self,
        command: ChangeTaskContent,
    ) -> Result<TaskView, TaskError> {
        log::info!("{:?}", command);
        let task = self.load(command.task_id, &command.username).await?;
        let changed = task.change_content(&command.new_content)?;
        Ok(self.repository.add(changed).await?.to_view())
    }

    pub async fn change_task_priority(
        &self,
        command: ChangeTaskPriority,
    ) -> Result<TaskView, TaskError> {
        log::info!("{:?}", command);
        let task = self.load(command.task_id, &command.username).await?;
        let changed = task.change_priority(command.new_priority);
        Ok(self.repository.add(changed).await?.to_view())
    }

    pub async fn change_task_status(
        &self,
        command: ChangeTaskStatus,
    ) -> Result<TaskView, TaskError> {
        log::info!("{:?}", command);
        let task = self.load(command.task_id, &command.username).await?;
        let changed = task.change_status(command.new_status);
        Ok(self.repository.add(changed).await?.to_view())
    }

    /// Removes a task and hands back its last state as confirmation.
    pub async fn remove_task(&self, command: RemoveTask) -> Result<TaskView, TaskError> {
        log::info!("{:?}", command);
        let task = self.load(command.task_id, &command.username).await?;
        self.repository.remove(&task).await?;
        log::info!("removed task {}", command.task_id);
        Ok(task.to_view())
    }

    pub async fn remove_all_task(&self, username: &str) -> Result<(), TaskError> {
        log::info!("removing all tasks of {}", username);
        self.repository.remove_all(username).await?;
        Ok(())
    }

    pub async fn read_all_tasks(&self, query: ReadAllTasks) -> Result<Vec<TaskView>, TaskError> {
        log::debug!("{:?}", query);
        let tasks = self.repository.get_all_by_owner(&query.username).await?;
        Ok(tasks.iter().map(Task::to_view).collect())
    }

    pub async fn read_task_by_owner_and_id(
        &self,
        query: ReadTaskByOwnerAndId,
    ) -> Result<Option<TaskView>, TaskError> {
        log::debug!("{:?}", query);
        let task = self
            .repository
            .get_by_owner_and_id(&query.username, query.task_id)
            .await?;
        Ok(task.as_ref().map(Task::to_view))
    }

    /// Writes every task of the user to `<export_dir>/<username>/<file_name>.txt`,
    /// replacing any previous export with the same name. Each task is one block,
    /// blocks are separated by a blank line.
    pub async fn export_tasks_to_file(&self, command: ExportTasks) -> Result<PathBuf, TaskError> {
        log::info!("{:?}", command);
        for component in [&command.username, &command.file_name] {
            if !is_plain_path_component(component) {
                return Err(TaskError::InvalidExportName(component.to_string()));
            }
        }

        let tasks = self.repository.get_all_by_owner(&command.username).await?;
        let contents: String = tasks.iter().map(|task| format!("{}\n\n", task)).collect();

        let user_dir = self.export_dir.join(&command.username);
        tokio::fs::create_dir_all(&user_dir)
            .await
            .map_err(|e| export_error(&user_dir, e))?;
        let path = user_dir.join(format!("{}.txt", command.file_name));
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| export_error(&path, e))?;

        log::info!("exported {} tasks to {}", tasks.len(), path.display());
        Ok(path)
    }

    async fn load(&self, task_id: i64, username: &str) -> Result<Task, TaskError> {
        self.repository
            .get_by_id(task_id)
            .await?
            .filter(|task| task.is_owned_by(username))
            .ok_or(TaskError::TaskNotFound(task_id))
    }
}

#[async_trait]
impl TaskCascade for TaskFacade {
    async fn remove_all_tasks_in(
        &self,
        tx: &mut dyn StorageTransaction,
        username: &str,
    ) -> Result<u64, TaskError> {
        let removed = tx.remove_all_tasks(username).await?;
        log::info!("removing {} tasks of {}", removed, username);
        Ok(removed)
    }
}

fn is_plain_path_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

fn export_error(path: &Path, error: std::io::Error) -> TaskError {
    TaskError::Export(format!("{}: {}", path.display(), error))
}
