//! Project aggregate root and health metric block.

use super::{DomainError, DomainResult, ProjectId, SprintId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Scoping and discovery.
    Discovery,
    /// Actively staffed.
    Active,
    /// On hold.
    Paused,
    /// Wrapped up.
    Closed,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }
}

/// Traffic-light classification of project health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// On track.
    Green,
    /// Needs attention.
    Yellow,
    /// At risk.
    Red,
}

/// Snapshot of project health derived from the project's tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectHealth {
    /// Number of tasks counted.
    pub total_tasks: u64,
    /// Histogram of task statuses.
    pub status_counts: BTreeMap<TaskStatus, u64>,
    /// Percentage of tasks that are done (0–100).
    pub completion_pct: f64,
    /// Percentage of tasks that are blocked (0–100).
    pub blocked_pct: f64,
    /// Traffic-light classification.
    pub health_status: HealthStatus,
    /// When this snapshot was computed.
    pub computed_at: DateTime<Utc>,
}

impl ProjectHealth {
    /// Computes a health snapshot from a status histogram.
    ///
    /// A project with zero tasks is explicitly 0% complete, 0% blocked,
    /// and green; the percentage rules below only apply when at least
    /// one task exists.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "health percentages are advisory ratios, not exact accounting"
    )]
    pub fn from_counts(status_counts: BTreeMap<TaskStatus, u64>, computed_at: DateTime<Utc>) -> Self {
        let total_tasks: u64 = status_counts.values().sum();
        if total_tasks == 0 {
            return Self {
                total_tasks: 0,
                status_counts,
                completion_pct: 0.0,
                blocked_pct: 0.0,
                health_status: HealthStatus::Green,
                computed_at,
            };
        }

        let done = status_counts.get(&TaskStatus::Done).copied().unwrap_or(0);
        let blocked = status_counts
            .get(&TaskStatus::Blocked)
            .copied()
            .unwrap_or(0);
        let completion_pct = (done as f64 / total_tasks as f64) * 100.0;
        let blocked_pct = (blocked as f64 / total_tasks as f64) * 100.0;

        let health_status = if blocked_pct > 20.0 {
            HealthStatus::Red
        } else if blocked_pct > 10.0 || completion_pct < 30.0 {
            HealthStatus::Yellow
        } else {
            HealthStatus::Green
        };

        Self {
            total_tasks,
            status_counts,
            completion_pct,
            blocked_pct,
            health_status,
            computed_at,
        }
    }
}

/// Validated input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Caller-supplied project identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Owning user.
    pub owner: String,
}

/// Partial update applied to an existing project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    /// New name.
    pub name: Option<String>,
    /// New lifecycle status.
    pub status: Option<ProjectStatus>,
    /// New owner.
    pub owner: Option<String>,
    /// Replacement sprint-id collection.
    pub sprint_ids: Option<Vec<SprintId>>,
    /// Refreshed health block.
    pub health: Option<ProjectHealth>,
}

/// Project aggregate root. Owns its tasks and sprints: deleting a
/// project cascade-deletes both (action lists are soft-detached instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    status: ProjectStatus,
    owner: String,
    sprint_ids: Vec<SprintId>,
    health: Option<ProjectHealth>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with an empty sprint collection.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the name or owner is empty.
    pub fn new(draft: NewProject, clock: &impl Clock) -> DomainResult<Self> {
        let timestamp = clock.utc();
        let name = non_empty(&draft.name, "name")?;
        let owner = non_empty(&draft.owner, "owner")?;
        Ok(Self {
            id: draft.id,
            name,
            status: draft.status,
            owner,
            sprint_ids: Vec::new(),
            health: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the owning user.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the sprint-id collection.
    #[must_use]
    pub fn sprint_ids(&self) -> &[SprintId] {
        &self.sprint_ids
    }

    /// Returns the last computed health block, if any.
    #[must_use]
    pub const fn health(&self) -> Option<&ProjectHealth> {
        self.health.as_ref()
    }

    /// Returns true when the sprint id is already registered.
    #[must_use]
    pub fn contains_sprint(&self, sprint_id: &SprintId) -> bool {
        self.sprint_ids.contains(sprint_id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when a supplied name or owner is
    /// empty.
    pub fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            self.name = non_empty(name, "name")?;
        }
        if let Some(owner) = &patch.owner {
            self.owner = non_empty(owner, "owner")?;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(sprint_ids) = patch.sprint_ids {
            self.sprint_ids = sprint_ids;
        }
        if let Some(health) = patch.health {
            self.health = Some(health);
        }
        self.updated_at = now;
        Ok(())
    }
}

fn non_empty(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!(
            "project {field} must not be empty"
        )));
    }
    Ok(trimmed.to_owned())
}
