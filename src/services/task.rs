//! Task service: creation, partial update, the status state machine,
//! bulk updates, and filtered search.

use crate::domain::{
    AcceptanceCriterion, DomainError, DomainResult, NewTask, Priority, ProjectId, QualityGate,
    Severity, SprintId, SprintPatch, Task, TaskId, TaskPatch, TaskStatus,
};
use crate::domain::{ErrorKind, Project};
use crate::ports::{Page, Repository, SprintRepository, TaskFilter, TaskRepository};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request payload for creating a task.
///
/// Identifiers arrive as raw strings from the boundary layer and are
/// validated here before any repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    id: String,
    title: String,
    owner: String,
    project_id: String,
    sprint_id: String,
    priority: Priority,
    severity: Severity,
    estimate: Option<u32>,
    related_projects: Vec<String>,
    related_sprints: Vec<String>,
    parents: Vec<String>,
    depends_on: Vec<String>,
    blocks: Vec<String>,
    blockers: Vec<String>,
    acceptance_criteria: Vec<AcceptanceCriterion>,
    quality_gates: Vec<QualityGate>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        owner: impl Into<String>,
        project_id: impl Into<String>,
        sprint_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            owner: owner.into(),
            project_id: project_id.into(),
            sprint_id: sprint_id.into(),
            priority: Priority::Medium,
            severity: Severity::Minor,
            estimate: None,
            related_projects: Vec::new(),
            related_sprints: Vec::new(),
            parents: Vec::new(),
            depends_on: Vec::new(),
            blocks: Vec::new(),
            blockers: Vec::new(),
            acceptance_criteria: Vec::new(),
            quality_gates: Vec::new(),
        }
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the impact severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the estimate in points.
    #[must_use]
    pub const fn with_estimate(mut self, estimate: u32) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// Sets related project ids.
    #[must_use]
    pub fn with_related_projects(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.related_projects = ids.into_iter().collect();
        self
    }

    /// Sets related sprint ids.
    #[must_use]
    pub fn with_related_sprints(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.related_sprints = ids.into_iter().collect();
        self
    }

    /// Sets parent task ids.
    #[must_use]
    pub fn with_parents(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.parents = ids.into_iter().collect();
        self
    }

    /// Sets depends-on task ids.
    #[must_use]
    pub fn with_depends_on(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.depends_on = ids.into_iter().collect();
        self
    }

    /// Sets blocked task ids.
    #[must_use]
    pub fn with_blocks(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.blocks = ids.into_iter().collect();
        self
    }

    /// Sets blocker task ids.
    #[must_use]
    pub fn with_blockers(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.blockers = ids.into_iter().collect();
        self
    }

    /// Sets acceptance criteria.
    #[must_use]
    pub fn with_acceptance_criteria(
        mut self,
        criteria: impl IntoIterator<Item = AcceptanceCriterion>,
    ) -> Self {
        self.acceptance_criteria = criteria.into_iter().collect();
        self
    }

    /// Sets quality gates.
    #[must_use]
    pub fn with_quality_gates(mut self, gates: impl IntoIterator<Item = QualityGate>) -> Self {
        self.quality_gates = gates.into_iter().collect();
        self
    }
}

/// One entry of a bulk update batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Task to update.
    pub id: TaskId,
    /// Partial update to apply.
    pub patch: TaskPatch,
}

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<R, P, S, C>
where
    R: TaskRepository,
    P: Repository<Project>,
    S: SprintRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    projects: Arc<P>,
    sprints: Arc<S>,
    clock: Arc<C>,
}

impl<R, P, S, C> TaskService<R, P, S, C>
where
    R: TaskRepository,
    P: Repository<Project>,
    S: SprintRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(tasks: Arc<R>, projects: Arc<P>, sprints: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            projects,
            sprints,
            clock,
        }
    }

    /// Creates a task at status `new` and registers it on its sprint.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when an id is malformed or a primary
    /// reference does not resolve, and `Conflict` when the task id is
    /// already taken.
    pub async fn create(&self, request: CreateTaskRequest) -> DomainResult<Task> {
        let id = TaskId::new(request.id)?;
        let project_id = ProjectId::new(request.project_id)?;
        let sprint_id = SprintId::new(request.sprint_id)?;
        self.ensure_project(&project_id).await?;
        self.ensure_sprint(&sprint_id).await?;

        let draft = NewTask {
            id,
            title: request.title,
            priority: request.priority,
            severity: request.severity,
            owner: request.owner,
            primary_project: project_id,
            primary_sprint: sprint_id.clone(),
            estimate: request.estimate,
            related_projects: parse_ids(request.related_projects, ProjectId::new)?,
            related_sprints: parse_ids(request.related_sprints, SprintId::new)?,
            parents: parse_ids(request.parents, TaskId::new)?,
            depends_on: parse_ids(request.depends_on, TaskId::new)?,
            blocks: parse_ids(request.blocks, TaskId::new)?,
            blockers: parse_ids(request.blockers, TaskId::new)?,
            acceptance_criteria: request.acceptance_criteria,
            quality_gates: request.quality_gates,
        };
        let task = Task::new(draft, &*self.clock)?;
        let stored = self.tasks.create(task).await?;
        self.register_on_sprint(&sprint_id, stored.id()).await?;
        debug!(task = %stored.id(), sprint = %sprint_id, "task created");
        Ok(stored)
    }

    /// Loads a task by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn get(&self, id: &TaskId) -> DomainResult<Task> {
        self.tasks.get(id).await
    }

    /// Applies a partial update; only supplied fields change.
    ///
    /// Reassigned primary references are validated against their
    /// repositories, and sprint task collections are kept in step when
    /// the primary sprint moves.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing task and `Validation` for an
    /// unresolved reference, an empty required field, or an illegal
    /// status transition.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> DomainResult<Task> {
        if let Some(project_id) = &patch.primary_project {
            self.ensure_project(project_id).await?;
        }
        if let Some(sprint_id) = &patch.primary_sprint {
            self.ensure_sprint(sprint_id).await?;
        }

        let previous_sprint = match &patch.primary_sprint {
            Some(_) => Some(self.tasks.get(id).await?.primary_sprint().clone()),
            None => None,
        };
        let updated = self.tasks.update(id, patch).await?;
        if let Some(old_sprint) = previous_sprint {
            if old_sprint != *updated.primary_sprint() {
                self.deregister_from_sprint(&old_sprint, id).await?;
                self.register_on_sprint(updated.primary_sprint(), id).await?;
            }
        }
        Ok(updated)
    }

    /// Transitions a task's status through the state machine.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing task and `Validation` naming
    /// the illegal `(current, requested)` pair for an invalid edge.
    pub async fn change_status(&self, id: &TaskId, status: TaskStatus) -> DomainResult<Task> {
        self.tasks.update(id, TaskPatch::status_change(status)).await
    }

    /// Applies a batch of updates one at a time through the
    /// single-entity path, failing fast.
    ///
    /// The first error halts the batch and is returned as-is; updates
    /// applied before it are not rolled back, so a retry resumes from
    /// committed progress.
    ///
    /// # Errors
    ///
    /// Returns the first failure produced by [`TaskService::update`].
    pub async fn bulk_update(&self, updates: Vec<TaskUpdate>) -> DomainResult<Vec<Task>> {
        let mut applied = Vec::with_capacity(updates.len());
        for entry in updates {
            match self.update(&entry.id, entry.patch).await {
                Ok(task) => applied.push(task),
                Err(err) => {
                    warn!(
                        task = %entry.id,
                        applied = applied.len(),
                        error = %err,
                        "bulk update halted; prior updates remain applied"
                    );
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }

    /// Returns all tasks matching the filter conjunction.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures; zero matches is `Ok`.
    pub async fn search(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        self.tasks.search(filter).await
    }

    /// Returns critical- and high-priority tasks, critical first.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn high_priority_tasks(&self) -> DomainResult<Vec<Task>> {
        let mut found = self
            .tasks
            .search(&TaskFilter::new().with_priority(Priority::Critical))
            .await?;
        let high = self
            .tasks
            .search(&TaskFilter::new().with_priority(Priority::High))
            .await?;
        found.extend(high);
        Ok(found)
    }

    /// Returns all blocked tasks.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn blocked_tasks(&self) -> DomainResult<Vec<Task>> {
        self.tasks
            .search(&TaskFilter::new().with_status(TaskStatus::Blocked))
            .await
    }

    /// Reassigns the primary sprint.
    ///
    /// Cross-project sprint membership is deliberately not validated
    /// here; the sprint only has to exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing task and `Validation` for a
    /// missing sprint.
    pub async fn assign_to_sprint(&self, id: &TaskId, sprint_id: &SprintId) -> DomainResult<Task> {
        let patch = TaskPatch {
            primary_sprint: Some(sprint_id.clone()),
            ..TaskPatch::default()
        };
        self.update(id, patch).await
    }

    /// Reassigns the primary project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing task and `Validation` for a
    /// missing project.
    pub async fn assign_to_project(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
    ) -> DomainResult<Task> {
        let patch = TaskPatch {
            primary_project: Some(project_id.clone()),
            ..TaskPatch::default()
        };
        self.update(id, patch).await
    }

    /// Hard-deletes a task and removes it from its sprint collection.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn delete(&self, id: &TaskId) -> DomainResult<()> {
        let task = self.tasks.get(id).await?;
        self.tasks.delete(id).await?;
        self.deregister_from_sprint(task.primary_sprint(), id).await
    }

    /// Lists one id-ordered window of tasks.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Task>> {
        self.tasks.list(limit, offset).await
    }

    async fn ensure_project(&self, id: &ProjectId) -> DomainResult<()> {
        if self.projects.exists(id).await? {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "primary project '{id}' does not exist"
            )))
        }
    }

    async fn ensure_sprint(&self, id: &SprintId) -> DomainResult<()> {
        if self.sprints.exists(id).await? {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "primary sprint '{id}' does not exist"
            )))
        }
    }

    async fn register_on_sprint(&self, sprint_id: &SprintId, task_id: &TaskId) -> DomainResult<()> {
        let sprint = self.sprints.get(sprint_id).await?;
        if sprint.task_ids().contains(task_id) {
            return Ok(());
        }
        let mut task_ids = sprint.task_ids().to_vec();
        task_ids.push(task_id.clone());
        let patch = SprintPatch {
            task_ids: Some(task_ids),
            ..SprintPatch::default()
        };
        self.sprints.update(sprint_id, patch).await.map(|_| ())
    }

    async fn deregister_from_sprint(
        &self,
        sprint_id: &SprintId,
        task_id: &TaskId,
    ) -> DomainResult<()> {
        let sprint = match self.sprints.get(sprint_id).await {
            Ok(sprint) => sprint,
            // The sprint may already be gone (cascade in flight).
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        if !sprint.task_ids().contains(task_id) {
            return Ok(());
        }
        let task_ids: Vec<TaskId> = sprint
            .task_ids()
            .iter()
            .filter(|id| *id != task_id)
            .cloned()
            .collect();
        let patch = SprintPatch {
            task_ids: Some(task_ids),
            ..SprintPatch::default()
        };
        self.sprints.update(sprint_id, patch).await.map(|_| ())
    }
}

fn parse_ids<T>(
    raw: Vec<String>,
    parse: impl Fn(String) -> DomainResult<T>,
) -> DomainResult<Vec<T>> {
    raw.into_iter().map(parse).collect()
}
