//! Backlog: task-tracking domain services.
//!
//! This crate provides the service layer for a task tracker: tasks with
//! a status state machine, projects with derived health metrics,
//! sprints with velocity and burndown reporting, and ordered action
//! lists with soft-delete visibility.
//!
//! # Architecture
//!
//! Backlog follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, Postgres)
//! - **Services**: Use-case orchestration across aggregates
//!
//! # Modules
//!
//! - [`domain`]: Aggregates, value objects, and the error taxonomy
//! - [`ports`]: The generic repository contract and its extensions
//! - [`adapters`]: In-memory and Diesel-backed Postgres repositories
//! - [`services`]: Task, project, sprint, and action list services

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
