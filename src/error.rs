//!
//! # HTTP Error Handling
//!
//! `AppError` is the error type of every route handler. It implements
//! `actix_web::error::ResponseError`, so handlers can return it directly and
//! actix renders a JSON body of the form `{"error": "<message>"}`.
//!
//! Domain errors convert into it with `?`: not-found kinds become 404, the
//! remaining domain failures become 400, and storage or hashing failures
//! become 500.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::{TaskError, UserError};

#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated, but not allowed to use the resource (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// A domain rule rejected the request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// A repository backend failed (HTTP 500, message kept generic).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// The request body or query did not pass `validator` checks (HTTP 422).
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::DatabaseError(detail) => {
                log::error!("database error: {}", detail);
                "Database error".to_string()
            }
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.clone(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> AppError {
        log::warn!("task command failed: {}", error);
        match error {
            ref e if e.is_not_found() => AppError::NotFound(e.to_string()),
            TaskError::Repository(e) => AppError::DatabaseError(e.to_string()),
            TaskError::Export(msg) => AppError::InternalServerError(msg),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<UserError> for AppError {
    fn from(error: UserError) -> AppError {
        log::warn!("user command failed: {}", error);
        match error {
            ref e if e.is_not_found() => AppError::NotFound(e.to_string()),
            UserError::Repository(e) | UserError::TaskCascade(TaskError::Repository(e)) => {
                AppError::DatabaseError(e.to_string())
            }
            UserError::TaskCascade(_) | UserError::PasswordEncoding(_) => {
                AppError::InternalServerError(error.to_string())
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Used when JWT processing (e.g. verification) fails.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::Forbidden("Admins only".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[test]
    fn test_domain_error_mapping() {
        let not_found: AppError = TaskError::TaskNotFound(3).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let too_long: AppError = TaskError::WrongTaskContentLength {
            length: 1001,
            max: 1000,
        }
        .into();
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);

        let missing_user: AppError = UserError::UserNotFound("alice".into()).into();
        assert_eq!(missing_user.status_code(), StatusCode::NOT_FOUND);

        let taken: AppError = UserError::NotUniqueUserName.into();
        assert_eq!(taken.status_code(), StatusCode::BAD_REQUEST);

        let bad_name: AppError = TaskError::InvalidExportName("al/ce".into()).into();
        assert_eq!(bad_name.status_code(), StatusCode::BAD_REQUEST);

        let io: AppError = TaskError::Export("disk full".into()).into();
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let storage: AppError =
            UserError::Repository(RepositoryError::Storage("down".into())).into();
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
