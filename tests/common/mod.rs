#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;
use std::path::Path;

use taskkeeper::auth::{AuthMiddleware, AuthResponse};
use taskkeeper::routes::{self, health};
use taskkeeper::{AppState, Config};

pub fn test_config(export_dir: &Path) -> Config {
    Config {
        database_url: None,
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiration_hours: 1,
        // bcrypt's minimum cost keeps the suite fast.
        bcrypt_cost: 4,
        export_dir: export_dir.to_path_buf(),
        register_main_admin: false,
        main_admin_username: "MainAdmin".to_string(),
        main_admin_password: "12345".to_string(),
    }
}

/// The same App `main` builds, over the given state.
pub async fn init_app(
    state: &AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .configure(|cfg| state.configure(cfg))
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(state.tokens().clone()))
                    .configure(routes::config),
            ),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> StatusCode {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    test::call_service(app, req).await.status()
}

pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> Result<AuthResponse, StatusCode> {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    if !resp.status().is_success() {
        return Err(resp.status());
    }
    Ok(test::read_body_json(resp).await)
}

/// Registers `username` and returns a fresh token for it.
pub async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> String {
    assert_eq!(register(app, username, password).await, StatusCode::CREATED);
    login(app, username, password)
        .await
        .unwrap_or_else(|status| panic!("login of {} failed with {}", username, status))
        .token
}
