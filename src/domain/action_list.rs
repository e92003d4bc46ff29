//! Action list aggregate root: ordered items and soft-delete marker.
//!
//! Action lists reference a project and/or sprint but are not owned by
//! them: when a parent is deleted the link is nulled and
//! `parent_deleted_at` is set, leaving the list retrievable through a
//! dedicated query while hidden from default listings. This asymmetry
//! with the cascade-deleted Task/Sprint children is intentional.

use super::{ActionListId, DomainResult, ProjectId, SprintId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Action list lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionListStatus {
    /// List is in use.
    Active,
    /// Every item has been worked through.
    Completed,
    /// List is kept for reference only.
    Archived,
}

impl ActionListStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

/// A single entry in an action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    /// What needs doing.
    pub text: String,
    /// Whether the item has been completed.
    pub done: bool,
}

impl ActionItem {
    /// Creates an open item.
    #[must_use]
    pub fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// Validated input for creating an action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActionList {
    /// Caller-supplied list identifier.
    pub id: ActionListId,
    /// Lifecycle status.
    pub status: ActionListStatus,
    /// Optional owning project.
    pub project_id: Option<ProjectId>,
    /// Optional owning sprint.
    pub sprint_id: Option<SprintId>,
    /// Initial ordered items.
    pub items: Vec<ActionItem>,
}

/// Partial update applied to an existing action list.
///
/// The nullable parent links use a double `Option`: `None` leaves the
/// link untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionListPatch {
    /// New lifecycle status.
    pub status: Option<ActionListStatus>,
    /// New project link (`Some(None)` clears it).
    pub project_id: Option<Option<ProjectId>>,
    /// New sprint link (`Some(None)` clears it).
    pub sprint_id: Option<Option<SprintId>>,
    /// Replacement ordered item list.
    pub items: Option<Vec<ActionItem>>,
    /// Soft-delete marker (`Some(Some(_))` marks, `Some(None)` clears).
    pub parent_deleted_at: Option<Option<DateTime<Utc>>>,
}

/// Action list aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionList {
    id: ActionListId,
    status: ActionListStatus,
    project_id: Option<ProjectId>,
    sprint_id: Option<SprintId>,
    items: Vec<ActionItem>,
    parent_deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ActionList {
    /// Creates a new action list.
    #[must_use]
    pub fn new(draft: NewActionList, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: draft.id,
            status: draft.status,
            project_id: draft.project_id,
            sprint_id: draft.sprint_id,
            items: draft.items,
            parent_deleted_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the list identifier.
    #[must_use]
    pub const fn id(&self) -> &ActionListId {
        &self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ActionListStatus {
        self.status
    }

    /// Returns the project link, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    /// Returns the sprint link, if any.
    #[must_use]
    pub const fn sprint_id(&self) -> Option<&SprintId> {
        self.sprint_id.as_ref()
    }

    /// Returns the ordered items.
    #[must_use]
    pub fn items(&self) -> &[ActionItem] {
        &self.items
    }

    /// Returns the soft-delete marker, if set.
    #[must_use]
    pub const fn parent_deleted_at(&self) -> Option<DateTime<Utc>> {
        self.parent_deleted_at
    }

    /// Returns true when a deleted parent has soft-detached this list.
    #[must_use]
    pub const fn is_soft_deleted(&self) -> bool {
        self.parent_deleted_at.is_some()
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
    /// Infallible today; returns `DomainResult` so patch application is
    /// uniform across aggregates.
    pub fn apply_patch(
        &mut self,
        patch: ActionListPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(sprint_id) = patch.sprint_id {
            self.sprint_id = sprint_id;
        }
        if let Some(items) = patch.items {
            self.items = items;
        }
        if let Some(marker) = patch.parent_deleted_at {
            self.parent_deleted_at = marker;
        }
        self.updated_at = now;
        Ok(())
    }
}
