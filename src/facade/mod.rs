//! Command handlers: the entry points the transport calls.

pub mod commands;
pub mod factory;
pub mod tasks;
pub mod users;

pub use factory::UserFactory;
pub use tasks::TaskFacade;
pub use users::{TaskCascade, UserFacade};
