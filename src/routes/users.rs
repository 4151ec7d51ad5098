//! Account routes: `/user` acts on the caller's own account, `/users` is the
//! administrator's view of every account.

use actix_web::{delete, get, patch, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::{
    auth::{AuthenticatedUser, ChangePasswordRequest},
    error::AppError,
    facade::{
        commands::{ChangeUserPassword, ChangeUserStatus},
        UserFacade,
    },
    models::UserStatus,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub new_status: UserStatus,
}

#[patch("/password")]
pub async fn change_own_password(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    let view = users
        .change_user_password(ChangeUserPassword {
            username: user.username,
            new_password: body.into_inner().new_password,
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Deletes the caller's account together with all of their tasks.
#[delete("")]
pub async fn delete_own_account(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    users.remove_user_by_username(&user.username).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("")]
pub async fn get_users(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user.require_admin()?;
    Ok(HttpResponse::Ok().json(users.read_all_users().await?))
}

#[get("/{username}")]
pub async fn get_user(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
    username: web::Path<String>,
) -> Result<impl Responder, AppError> {
    user.require_admin()?;
    let username = username.into_inner();
    let view = users
        .read_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", username)))?;
    Ok(HttpResponse::Ok().json(view))
}

/// Bans or reopens an account.
#[patch("/{username}/status")]
pub async fn change_status(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
    username: web::Path<String>,
    query: web::Query<StatusQuery>,
) -> Result<impl Responder, AppError> {
    user.require_admin()?;
    let view = users
        .change_user_status(ChangeUserStatus {
            username: username.into_inner(),
            new_status: query.new_status,
        })
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/{username}")]
pub async fn delete_user(
    users: web::Data<UserFacade>,
    user: AuthenticatedUser,
    username: web::Path<String>,
) -> Result<impl Responder, AppError> {
    user.require_admin()?;
    users.remove_user_by_username(&username).await?;
    Ok(HttpResponse::NoContent().finish())
}
