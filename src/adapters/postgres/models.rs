//! Diesel row models for the four aggregate tables.
//!
//! Rows carry the serialized aggregate plus denormalized filter columns;
//! the `data` payload is the source of truth when reconstructing an
//! aggregate.

use super::schema::{action_lists, projects, sprints, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row model for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: String,
    /// Scheduling priority.
    pub priority: String,
    /// Owning user.
    pub owner: String,
    /// Primary project identifier.
    pub project_id: String,
    /// Primary sprint identifier.
    pub sprint_id: String,
    /// Full aggregate payload.
    pub data: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for project records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: String,
    /// Lifecycle status.
    pub status: String,
    /// Full aggregate payload.
    pub data: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for sprint records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SprintRow {
    /// Sprint identifier.
    pub id: String,
    /// Primary project identifier.
    pub project_id: String,
    /// Full aggregate payload.
    pub data: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for action list records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = action_lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActionListRow {
    /// List identifier.
    pub id: String,
    /// Linked project, if any.
    pub project_id: Option<String>,
    /// Linked sprint, if any.
    pub sprint_id: Option<String>,
    /// Soft-delete marker, if set.
    pub parent_deleted_at: Option<DateTime<Utc>>,
    /// Full aggregate payload.
    pub data: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
