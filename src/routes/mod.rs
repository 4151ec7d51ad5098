pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Routes mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/user")
            .service(users::change_own_password)
            .service(users::delete_own_account),
    )
    .service(
        web::scope("/users")
            .service(users::get_users)
            .service(users::get_user)
            .service(users::change_status)
            .service(users::delete_user),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::export_tasks)
            .service(tasks::get_task)
            .service(tasks::change_content)
            .service(tasks::change_priority)
            .service(tasks::change_status)
            .service(tasks::delete_task),
    );
}
