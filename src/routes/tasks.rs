use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    facade::{
        commands::{
            ChangeTaskContent, ChangeTaskPriority, ChangeTaskStatus, CreateTask, ExportTasks,
            ReadAllTasks, ReadTaskByOwnerAndId, RemoveTask,
        },
        TaskFacade,
    },
    models::{TaskPriority, TaskStatus},
};

lazy_static! {
    // Export names become file names: letters, digits, underscores, hyphens.
    static ref FILE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub content: String,
    pub priority: TaskPriority,
    /// `UNDONE` when omitted.
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeContentRequest {
    pub new_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityQuery {
    pub new_priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub new_status: TaskStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[validate(regex(
        path = "FILE_NAME_REGEX",
        message = "File name must be 1-64 letters, digits, underscores or hyphens"
    ))]
    pub file_name: String,
}

/// Lists every task of the authenticated user, in id order.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let views = tasks
        .read_all_tasks(ReadAllTasks {
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Creates a task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the stored `TaskView`, with its assigned id.
/// - `400 Bad Request`: content longer than 1000 characters.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let CreateTaskRequest {
        content,
        priority,
        status,
    } = task_data.into_inner();
    let view = tasks
        .create_task(CreateTask {
            content,
            priority,
            status: status.unwrap_or(TaskStatus::Undone),
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Writes all of the user's tasks to a text file on the server and returns
/// where it went.
#[post("/textFile")]
pub async fn export_tasks(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    query: web::Query<ExportQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let ExportQuery { file_name } = query.into_inner();
    let path = tasks
        .export_tasks_to_file(ExportTasks {
            username: user.username,
            file_name: file_name.clone(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "fileName": file_name,
        "path": path.display().to_string(),
    })))
}

/// `404` when the task does not exist or belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    let view = tasks
        .read_task_by_owner_and_id(ReadTaskByOwnerAndId {
            username: user.username,
            task_id,
        })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task not found: {}", task_id)))?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/{id}/content")]
pub async fn change_content(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
    body: web::Json<ChangeContentRequest>,
) -> Result<impl Responder, AppError> {
    let view = tasks
        .change_task_content(ChangeTaskContent {
            task_id: task_id.into_inner(),
            new_content: body.into_inner().new_content,
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/{id}/priority")]
pub async fn change_priority(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
    query: web::Query<PriorityQuery>,
) -> Result<impl Responder, AppError> {
    let view = tasks
        .change_task_priority(ChangeTaskPriority {
            task_id: task_id.into_inner(),
            new_priority: query.new_priority,
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/{id}/status")]
pub async fn change_status(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
    query: web::Query<StatusQuery>,
) -> Result<impl Responder, AppError> {
    let view = tasks
        .change_task_status(ChangeTaskStatus {
            task_id: task_id.into_inner(),
            new_status: query.new_status,
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskFacade>,
    user: AuthenticatedUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    tasks
        .remove_task(RemoveTask {
            task_id: task_id.into_inner(),
            username: user.username,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_query_validation() {
        for valid in ["tasks", "my-tasks_2024", "A"] {
            let query = ExportQuery {
                file_name: valid.to_string(),
            };
            assert!(query.validate().is_ok(), "{} should be accepted", valid);
        }

        let too_long = "x".repeat(65);
        for invalid in ["", "../escape", "with space", "dots.txt", too_long.as_str()] {
            let query = ExportQuery {
                file_name: invalid.to_string(),
            };
            assert!(query.validate().is_err(), "{} should be rejected", invalid);
        }
    }

    #[test]
    fn test_status_query_uses_uppercase_names() {
        let query: StatusQuery = serde_json::from_str(r#"{"newStatus":"DONE"}"#).unwrap();
        assert_eq!(query.new_status, TaskStatus::Done);
        assert!(serde_json::from_str::<StatusQuery>(r#"{"newStatus":"done"}"#).is_err());
    }
}
