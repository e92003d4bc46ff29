//! Generic repository port and per-entity extension contracts.
//!
//! The repository is the sole owner of storage transactions. Every
//! operation returns [`DomainResult`]; implementations translate raw
//! storage failures into the error taxonomy before they escape (duplicate
//! key becomes `Conflict`, missing foreign key becomes `Validation`,
//! transient failure becomes `Database`). `NotFound` is reserved for
//! single-id lookups: listing an empty table is success.

use crate::domain::{
    ActionList, ActionListId, ActionListPatch, DomainResult, Priority, Project, ProjectId,
    ProjectPatch, Sprint, SprintId, SprintPatch, Task, TaskId, TaskPatch, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::Hash;

/// An aggregate root that can be stored through the generic repository.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identifier type.
    type Id: Clone + Eq + Ord + Hash + fmt::Display + Send + Sync + 'static;
    /// Partial-update type.
    type Patch: Send + 'static;

    /// Noun used in error messages (`task`, `project`, ...).
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Applies a partial update, stamping `updated_at` with `now`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the patch violates an entity
    /// invariant (illegal status transition, empty required field,
    /// inverted date range).
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> DomainResult<()>;
}

/// One window of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    /// Entities in this window, ordered by id.
    pub items: Vec<E>,
    /// Total entities across all windows.
    pub total: u64,
    /// Requested window size.
    pub limit: u32,
    /// Requested window start.
    pub offset: u32,
}

/// Type-parameterized CRUD contract over one entity type.
///
/// Each write executes inside one storage transaction; a
/// state-check-then-write (such as a status transition inside
/// [`Repository::update`]) never spans transactions.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Stores a new entity and returns it.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the id already exists and `Database` for
    /// storage failures.
    async fn create(&self, entity: E) -> DomainResult<E>;

    /// Loads an entity by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not exist.
    async fn get(&self, id: &E::Id) -> DomainResult<E>;

    /// Loads, patches, and persists an entity in one transaction.
    ///
    /// Only supplied patch fields are applied.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not exist and `Validation`
    /// when the patch violates an entity invariant.
    async fn update(&self, id: &E::Id, patch: E::Patch) -> DomainResult<E>;

    /// Hard-deletes an entity by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id does not exist.
    async fn delete(&self, id: &E::Id) -> DomainResult<()>;

    /// Lists one id-ordered window of entities.
    ///
    /// An empty table yields an empty page, never an error.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<E>>;

    /// Returns whether an entity with the id exists.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn exists(&self, id: &E::Id) -> DomainResult<bool>;

    /// Returns the total number of stored entities.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn count(&self) -> DomainResult<u64>;
}

/// Conjunction of optional task filters; absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Match tasks with this status.
    pub status: Option<TaskStatus>,
    /// Match tasks with this priority.
    pub priority: Option<Priority>,
    /// Match tasks with this owner.
    pub owner: Option<String>,
    /// Match tasks whose primary project is this id.
    pub project_id: Option<ProjectId>,
    /// Match tasks whose primary sprint is this id.
    pub sprint_id: Option<SprintId>,
}

impl TaskFilter {
    /// Creates an empty filter matching every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to one priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts to one owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Restricts to one primary project.
    #[must_use]
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Restricts to one primary sprint.
    #[must_use]
    pub fn with_sprint(mut self, sprint_id: SprintId) -> Self {
        self.sprint_id = Some(sprint_id);
        self
    }

    /// Returns true when the task satisfies every supplied filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status() == status)
            && self.priority.is_none_or(|priority| task.priority() == priority)
            && self
                .owner
                .as_deref()
                .is_none_or(|owner| task.owner() == owner)
            && self
                .project_id
                .as_ref()
                .is_none_or(|id| task.primary_project() == id)
            && self
                .sprint_id
                .as_ref()
                .is_none_or(|id| task.primary_sprint() == id)
    }
}

/// Task repository: the generic contract plus filtered search.
#[async_trait]
pub trait TaskRepository: Repository<Task> {
    /// Returns all tasks matching the filter conjunction, ordered by id.
    ///
    /// Zero matches is success, not `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn search(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>>;
}

/// Sprint repository: the generic contract plus project scoping.
#[async_trait]
pub trait SprintRepository: Repository<Sprint> {
    /// Returns all sprints whose primary project is the given id.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<Sprint>>;
}

/// Action list repository: the generic contract plus soft-delete
/// visibility and parent scoping.
#[async_trait]
pub trait ActionListRepository: Repository<ActionList> {
    /// Lists one window of lists whose soft-delete marker is unset.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list_visible(&self, limit: u32, offset: u32) -> DomainResult<Page<ActionList>>;

    /// Returns every soft-deleted list (the dedicated recovery query).
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list_deleted(&self) -> DomainResult<Vec<ActionList>>;

    /// Returns every list linked to the given project.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<ActionList>>;

    /// Returns every list linked to the given sprint.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    async fn list_by_sprint(&self, sprint_id: &SprintId) -> DomainResult<Vec<ActionList>>;
}

impl Entity for Task {
    type Id = TaskId;
    type Patch = TaskPatch;

    const KIND: &'static str = "task";

    fn id(&self) -> &TaskId {
        Task::id(self)
    }

    fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> DomainResult<()> {
        Task::apply_patch(self, patch, now)
    }
}

impl Entity for Project {
    type Id = ProjectId;
    type Patch = ProjectPatch;

    const KIND: &'static str = "project";

    fn id(&self) -> &ProjectId {
        Project::id(self)
    }

    fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) -> DomainResult<()> {
        Project::apply_patch(self, patch, now)
    }
}

impl Entity for Sprint {
    type Id = SprintId;
    type Patch = SprintPatch;

    const KIND: &'static str = "sprint";

    fn id(&self) -> &SprintId {
        Sprint::id(self)
    }

    fn apply_patch(&mut self, patch: SprintPatch, now: DateTime<Utc>) -> DomainResult<()> {
        Sprint::apply_patch(self, patch, now)
    }
}

impl Entity for ActionList {
    type Id = ActionListId;
    type Patch = ActionListPatch;

    const KIND: &'static str = "action list";

    fn id(&self) -> &ActionListId {
        ActionList::id(self)
    }

    fn apply_patch(&mut self, patch: ActionListPatch, now: DateTime<Utc>) -> DomainResult<()> {
        ActionList::apply_patch(self, patch, now)
    }
}
