//! `PostgreSQL` adapters for the four aggregate repositories.
//!
//! Schema migrations are owned by the deployment tooling, not this
//! crate; the adapters assume the declared tables exist.

mod action_lists;
mod models;
mod projects;
mod schema;
mod sprints;
mod support;
mod tasks;

pub use action_lists::PgActionListRepository;
pub use projects::PgProjectRepository;
pub use sprints::PgSprintRepository;
pub use support::{PgPool, build_pool};
pub use tasks::PgTaskRepository;
