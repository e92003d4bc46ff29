//! Sprint service: lifecycle, cascade deletion, velocity, and burndown.

use crate::domain::{
    Burndown, Cadence, DomainError, DomainResult, ErrorKind, NewSprint, Project, ProjectId,
    ProjectPatch, Sprint, SprintId, SprintPatch, Task, TaskStatus,
};
use crate::ports::{
    ActionListRepository, Page, Repository, SprintRepository, TaskFilter, TaskRepository,
};
use crate::services::detach_lists;
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSprintRequest {
    id: String,
    cadence: Cadence,
    start_date: NaiveDate,
    end_date: NaiveDate,
    project_id: String,
    committed_points: u32,
}

impl CreateSprintRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        cadence: Cadence,
        start_date: NaiveDate,
        end_date: NaiveDate,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            cadence,
            start_date,
            end_date,
            project_id: project_id.into(),
            committed_points: 0,
        }
    }

    /// Sets the points committed at planning time.
    #[must_use]
    pub const fn with_committed_points(mut self, points: u32) -> Self {
        self.committed_points = points;
        self
    }
}

/// Sprint orchestration service.
#[derive(Clone)]
pub struct SprintService<S, P, R, L, C>
where
    S: SprintRepository,
    P: Repository<Project>,
    R: TaskRepository,
    L: ActionListRepository,
    C: Clock + Send + Sync,
{
    sprints: Arc<S>,
    projects: Arc<P>,
    tasks: Arc<R>,
    lists: Arc<L>,
    clock: Arc<C>,
}

impl<S, P, R, L, C> SprintService<S, P, R, L, C>
where
    S: SprintRepository,
    P: Repository<Project>,
    R: TaskRepository,
    L: ActionListRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new sprint service.
    #[must_use]
    pub const fn new(
        sprints: Arc<S>,
        projects: Arc<P>,
        tasks: Arc<R>,
        lists: Arc<L>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            sprints,
            projects,
            tasks,
            lists,
            clock,
        }
    }

    /// Creates a sprint and registers it on its project.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed id, an inverted date range,
    /// or a missing project, and `Conflict` when the id is taken.
    pub async fn create(&self, request: CreateSprintRequest) -> DomainResult<Sprint> {
        let id = SprintId::new(request.id)?;
        let project_id = ProjectId::new(request.project_id)?;
        let project = self.projects.get(&project_id).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                DomainError::validation(format!("primary project '{project_id}' does not exist"))
            } else {
                err
            }
        })?;

        let draft = NewSprint {
            id,
            cadence: request.cadence,
            start_date: request.start_date,
            end_date: request.end_date,
            primary_project: project_id.clone(),
            committed_points: request.committed_points,
        };
        let sprint = Sprint::new(draft, &*self.clock)?;
        let stored = self.sprints.create(sprint).await?;

        if !project.contains_sprint(stored.id()) {
            let mut sprint_ids = project.sprint_ids().to_vec();
            sprint_ids.push(stored.id().clone());
            let patch = ProjectPatch {
                sprint_ids: Some(sprint_ids),
                ..ProjectPatch::default()
            };
            self.projects.update(&project_id, patch).await?;
        }
        debug!(sprint = %stored.id(), project = %project_id, "sprint created");
        Ok(stored)
    }

    /// Loads a sprint by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the sprint does not exist.
    pub async fn get(&self, id: &SprintId) -> DomainResult<Sprint> {
        self.sprints.get(id).await
    }

    /// Applies a partial update; only supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing sprint and `Validation` when
    /// the resulting date range is inverted.
    pub async fn update(&self, id: &SprintId, patch: SprintPatch) -> DomainResult<Sprint> {
        self.sprints.update(id, patch).await
    }

    /// Lists one id-ordered window of sprints.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Sprint>> {
        self.sprints.list(limit, offset).await
    }

    /// Hard-deletes a sprint.
    ///
    /// Without `force`, a sprint that still has tasks is rejected with
    /// `Conflict`. With `force`, its tasks are cascade-deleted. Either
    /// way linked action lists are soft-detached (`sprint_id` nulled,
    /// `parent_deleted_at` stamped) and the sprint is removed from its
    /// project's registry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing sprint and `Conflict` when
    /// tasks exist and `force` is false.
    pub async fn delete(&self, id: &SprintId, force: bool) -> DomainResult<()> {
        let sprint = self.sprints.get(id).await?;
        let owned_tasks = self
            .tasks
            .search(&TaskFilter::new().with_sprint(id.clone()))
            .await?;

        if !force && !owned_tasks.is_empty() {
            return Err(DomainError::conflict(format!(
                "sprint '{id}' still has {} task(s); delete with force to cascade",
                owned_tasks.len()
            )));
        }

        for task in &owned_tasks {
            self.tasks.delete(task.id()).await?;
        }
        let now = self.clock.utc();
        let linked = self.lists.list_by_sprint(id).await?;
        detach_lists(&*self.lists, linked, now).await?;
        self.deregister_from_project(&sprint).await?;

        info!(sprint = %id, tasks = owned_tasks.len(), "sprint deleted with cascade");
        self.sprints.delete(id).await
    }

    /// Recomputes the sprint velocity from done tasks, persists it, and
    /// returns it.
    ///
    /// Velocity is the sum of estimates across done tasks; tasks
    /// without an estimate contribute zero.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the sprint does not exist.
    pub async fn velocity(&self, id: &SprintId) -> DomainResult<u32> {
        self.sprints.get(id).await?;
        let done = self
            .tasks
            .search(
                &TaskFilter::new()
                    .with_sprint(id.clone())
                    .with_status(TaskStatus::Done),
            )
            .await?;
        let velocity = sum_estimates(&done);

        let patch = SprintPatch {
            velocity: Some(velocity),
            ..SprintPatch::default()
        };
        self.sprints.update(id, patch).await?;
        Ok(velocity)
    }

    /// Builds a point-in-time burndown report for the sprint.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing sprint and `Validation` when
    /// the sprint has a zero-day date range.
    pub async fn burndown(&self, id: &SprintId) -> DomainResult<Burndown> {
        let sprint = self.sprints.get(id).await?;
        let all = self
            .tasks
            .search(&TaskFilter::new().with_sprint(id.clone()))
            .await?;
        let total = sum_estimates(&all);
        let completed = sum_estimates(all.iter().filter(|task| task.status() == TaskStatus::Done));
        let today = self.clock.utc().date_naive();
        Burndown::derive(&sprint, total, completed, today)
    }

    async fn deregister_from_project(&self, sprint: &Sprint) -> DomainResult<()> {
        let project = match self.projects.get(sprint.primary_project()).await {
            Ok(project) => project,
            // The project may already be gone (cascade in flight).
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        if !project.contains_sprint(sprint.id()) {
            return Ok(());
        }
        let sprint_ids: Vec<SprintId> = project
            .sprint_ids()
            .iter()
            .filter(|existing| *existing != sprint.id())
            .cloned()
            .collect();
        let patch = ProjectPatch {
            sprint_ids: Some(sprint_ids),
            ..ProjectPatch::default()
        };
        self.projects
            .update(sprint.primary_project(), patch)
            .await
            .map(|_| ())
    }
}

fn sum_estimates<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> u32 {
    tasks.into_iter().fold(0u32, |acc, task| {
        acc.saturating_add(task.estimate().unwrap_or(0))
    })
}
