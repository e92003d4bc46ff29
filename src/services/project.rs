//! Project service: health metrics, idempotent sprint registration, and
//! guarded cascade deletion.

use crate::domain::{
    ActionListPatch, DomainError, DomainResult, ErrorKind, NewProject, Project, ProjectHealth,
    ProjectId, ProjectPatch, ProjectStatus, Sprint, SprintId, TaskStatus,
};
use crate::ports::{
    ActionListRepository, Page, Repository, SprintRepository, TaskFilter, TaskRepository,
};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    id: String,
    name: String,
    owner: String,
    status: ProjectStatus,
}

impl CreateProjectRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            status: ProjectStatus::Discovery,
        }
    }

    /// Sets the initial lifecycle status.
    #[must_use]
    pub const fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }
}

/// Project orchestration service.
#[derive(Clone)]
pub struct ProjectService<P, S, R, L, C>
where
    P: Repository<Project>,
    S: SprintRepository,
    R: TaskRepository,
    L: ActionListRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    sprints: Arc<S>,
    tasks: Arc<R>,
    lists: Arc<L>,
    clock: Arc<C>,
}

impl<P, S, R, L, C> ProjectService<P, S, R, L, C>
where
    P: Repository<Project>,
    S: SprintRepository,
    R: TaskRepository,
    L: ActionListRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    #[must_use]
    pub const fn new(
        projects: Arc<P>,
        sprints: Arc<S>,
        tasks: Arc<R>,
        lists: Arc<L>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            projects,
            sprints,
            tasks,
            lists,
            clock,
        }
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed id or empty name/owner and
    /// `Conflict` when the id is already taken.
    pub async fn create(&self, request: CreateProjectRequest) -> DomainResult<Project> {
        let draft = NewProject {
            id: ProjectId::new(request.id)?,
            name: request.name,
            status: request.status,
            owner: request.owner,
        };
        let project = Project::new(draft, &*self.clock)?;
        self.projects.create(project).await
    }

    /// Loads a project by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the project does not exist.
    pub async fn get(&self, id: &ProjectId) -> DomainResult<Project> {
        self.projects.get(id).await
    }

    /// Applies a partial update; only supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing project and `Validation` for an
    /// empty name/owner.
    pub async fn update(&self, id: &ProjectId, patch: ProjectPatch) -> DomainResult<Project> {
        self.projects.update(id, patch).await
    }

    /// Lists one id-ordered window of projects.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Project>> {
        self.projects.list(limit, offset).await
    }

    /// Registers a sprint id on the project.
    ///
    /// Adding an already-present id succeeds as a no-op rather than
    /// escalating to `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing project and `Validation` for a
    /// missing sprint.
    pub async fn add_sprint(&self, id: &ProjectId, sprint_id: &SprintId) -> DomainResult<Project> {
        let project = self.projects.get(id).await?;
        if project.contains_sprint(sprint_id) {
            debug!(project = %id, sprint = %sprint_id, "sprint already registered; no-op");
            return Ok(project);
        }
        if !self.sprints.exists(sprint_id).await? {
            return Err(DomainError::validation(format!(
                "sprint '{sprint_id}' does not exist"
            )));
        }
        let mut sprint_ids = project.sprint_ids().to_vec();
        sprint_ids.push(sprint_id.clone());
        let patch = ProjectPatch {
            sprint_ids: Some(sprint_ids),
            ..ProjectPatch::default()
        };
        self.projects.update(id, patch).await
    }

    /// Removes a sprint id from the project.
    ///
    /// Removing an absent id succeeds as a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the project does not exist.
    pub async fn remove_sprint(
        &self,
        id: &ProjectId,
        sprint_id: &SprintId,
    ) -> DomainResult<Project> {
        let project = self.projects.get(id).await?;
        if !project.contains_sprint(sprint_id) {
            debug!(project = %id, sprint = %sprint_id, "sprint not registered; no-op");
            return Ok(project);
        }
        let sprint_ids: Vec<SprintId> = project
            .sprint_ids()
            .iter()
            .filter(|existing| *existing != sprint_id)
            .cloned()
            .collect();
        let patch = ProjectPatch {
            sprint_ids: Some(sprint_ids),
            ..ProjectPatch::default()
        };
        self.projects.update(id, patch).await
    }

    /// Computes the project health block from its current tasks,
    /// persists it on the project, and returns it.
    ///
    /// A project with zero tasks reports 0% completion and green
    /// health, never a division error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the project does not exist.
    pub async fn metrics(&self, id: &ProjectId) -> DomainResult<ProjectHealth> {
        self.projects.get(id).await?;
        let found = self
            .tasks
            .search(&TaskFilter::new().with_project(id.clone()))
            .await?;

        let mut status_counts: BTreeMap<TaskStatus, u64> = BTreeMap::new();
        for task in &found {
            *status_counts.entry(task.status()).or_insert(0) += 1;
        }
        let health = ProjectHealth::from_counts(status_counts, self.clock.utc());

        let patch = ProjectPatch {
            health: Some(health.clone()),
            ..ProjectPatch::default()
        };
        self.projects.update(id, patch).await?;
        Ok(health)
    }

    /// Hard-deletes a project.
    ///
    /// Without `force`, a project that still owns tasks or sprints is
    /// rejected with `Conflict`. With `force`, owned tasks and sprints
    /// are cascade-deleted, along with any task whose primary sprint is
    /// one of the owned sprints. Action lists linked to the project or
    /// to an owned sprint are soft-detached (the deleted parent links
    /// nulled, `parent_deleted_at` stamped).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing project and `Conflict` when
    /// children exist and `force` is false.
    pub async fn delete(&self, id: &ProjectId, force: bool) -> DomainResult<()> {
        self.projects.get(id).await?;
        let owned_tasks = self
            .tasks
            .search(&TaskFilter::new().with_project(id.clone()))
            .await?;
        let owned_sprints = self.sprints.list_by_project(id).await?;

        if !force && (!owned_tasks.is_empty() || !owned_sprints.is_empty()) {
            return Err(DomainError::conflict(format!(
                "project '{id}' still owns {} task(s) and {} sprint(s); delete with force to cascade",
                owned_tasks.len(),
                owned_sprints.len()
            )));
        }

        for task in &owned_tasks {
            self.tasks.delete(task.id()).await?;
        }
        let mut linked = self.lists.list_by_project(id).await?;
        for sprint in &owned_sprints {
            // Tasks and lists reaching the project only through this
            // sprint must not be left with a dangling sprint link.
            let sprint_tasks = self
                .tasks
                .search(&TaskFilter::new().with_sprint(sprint.id().clone()))
                .await?;
            for task in sprint_tasks {
                match self.tasks.delete(task.id()).await {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
            }
            for list in self.lists.list_by_sprint(sprint.id()).await? {
                if linked.iter().all(|known| known.id() != list.id()) {
                    linked.push(list);
                }
            }
            match self.sprints.delete(sprint.id()).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        let now = self.clock.utc();
        let owned_sprint_ids: BTreeSet<&SprintId> = owned_sprints.iter().map(Sprint::id).collect();
        for list in linked {
            let clear_sprint = list
                .sprint_id()
                .is_some_and(|sprint_id| owned_sprint_ids.contains(sprint_id));
            let patch = ActionListPatch {
                project_id: (list.project_id() == Some(id)).then_some(None),
                sprint_id: clear_sprint.then_some(None),
                parent_deleted_at: Some(Some(now)),
                ..ActionListPatch::default()
            };
            self.lists.update(list.id(), patch).await?;
        }

        info!(
            project = %id,
            tasks = owned_tasks.len(),
            sprints = owned_sprints.len(),
            "project deleted with cascade"
        );
        self.projects.delete(id).await
    }
}
