use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{AuthResponse, LoginRequest, RegisterRequest, TokenService},
    error::AppError,
    facade::{commands::RegisterUser, UserFacade},
    models::UserStatus,
};

/// Register a new user
///
/// Creates a `COMMON` account and returns its view. No token is issued; the
/// client logs in afterwards.
///
/// ## Responses:
/// - `201 Created`: the stored `UserView` (password hashed).
/// - `400 Bad Request`: username or password length out of range, or the
///   username is taken.
#[post("/register")]
pub async fn register(
    users: web::Data<UserFacade>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let RegisterRequest { username, password } = register_data.into_inner();
    let view = users
        .register_user(RegisterUser { username, password })
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Login user
///
/// Checks the password against the stored hash and returns a bearer token.
/// Unknown usernames, wrong passwords and banned accounts all get `401`.
#[post("/login")]
pub async fn login(
    users: web::Data<UserFacade>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let auth = users
        .authenticate(&login_data.username, &login_data.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if auth.status == UserStatus::Banned {
        log::warn!("login refused for banned user {}", auth.username);
        return Err(AppError::Unauthorized("Account is banned".into()));
    }

    let token = tokens.generate(&auth.username, auth.role)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        username: auth.username,
        role: auth.role,
    }))
}
