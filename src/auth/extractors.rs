use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::UserRole;

/// The principal of a request that went through `AuthMiddleware`.
///
/// Built from the [`Claims`] the middleware leaves in the request extensions;
/// a request without them is rejected with `AppError::Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Administrator-only routes call this first.
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            UserRole::Admin => Ok(()),
            UserRole::Common => Err(AppError::Forbidden("Admin role required".into())),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedUser {
                username: claims.sub.clone(),
                role: claims.role,
            })),
            None => {
                let err = AppError::Unauthorized("No authenticated user in request".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
