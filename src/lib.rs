#![doc = "The `taskkeeper` library crate."]
#![doc = ""]
#![doc = "Task and user aggregates, the command facades over them, their in-memory"]
#![doc = "and Postgres repositories, and the actix-web transport (JWT auth, routes,"]
#![doc = "error mapping). The binary in `main.rs` only wires these together."]

pub mod auth;
pub mod config;
pub mod error;
pub mod facade;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
