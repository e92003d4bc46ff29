//! Port contracts for the domain service layer.
//!
//! Ports define infrastructure-agnostic interfaces used by the services.

pub mod repository;

pub use repository::{
    ActionListRepository, Entity, Page, Repository, SprintRepository, TaskFilter,
    TaskRepository,
};
