//! Shared service stage over in-memory repositories.

use crate::adapters::memory::{
    InMemoryActionListRepository, InMemoryProjectRepository, InMemorySprintRepository,
    InMemoryTaskRepository,
};
use crate::domain::{Cadence, DomainResult, Project, Sprint, Task};
use crate::services::{
    ActionListService, CreateProjectRequest, CreateSprintRequest, CreateTaskRequest,
    ProjectService, SprintService, TaskService,
};
use chrono::NaiveDate;
use mockable::DefaultClock;
use std::sync::Arc;

pub(crate) type TestTaskService = TaskService<
    InMemoryTaskRepository,
    InMemoryProjectRepository,
    InMemorySprintRepository,
    DefaultClock,
>;

pub(crate) type TestProjectService = ProjectService<
    InMemoryProjectRepository,
    InMemorySprintRepository,
    InMemoryTaskRepository,
    InMemoryActionListRepository,
    DefaultClock,
>;

pub(crate) type TestSprintService = SprintService<
    InMemorySprintRepository,
    InMemoryProjectRepository,
    InMemoryTaskRepository,
    InMemoryActionListRepository,
    DefaultClock,
>;

pub(crate) type TestActionListService = ActionListService<
    InMemoryActionListRepository,
    InMemoryProjectRepository,
    InMemorySprintRepository,
    DefaultClock,
>;

/// Every service wired over one shared set of in-memory repositories.
pub(crate) struct Stage {
    pub tasks: Arc<InMemoryTaskRepository>,
    pub projects: Arc<InMemoryProjectRepository>,
    pub sprints: Arc<InMemorySprintRepository>,
    pub lists: Arc<InMemoryActionListRepository>,
    pub task_service: TestTaskService,
    pub project_service: TestProjectService,
    pub sprint_service: TestSprintService,
    pub list_service: TestActionListService,
}

impl Stage {
    pub(crate) fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let projects = Arc::new(InMemoryProjectRepository::new());
        let sprints = Arc::new(InMemorySprintRepository::new());
        let lists = Arc::new(InMemoryActionListRepository::new());
        let clock = Arc::new(DefaultClock);

        let task_service = TaskService::new(
            Arc::clone(&tasks),
            Arc::clone(&projects),
            Arc::clone(&sprints),
            Arc::clone(&clock),
        );
        let project_service = ProjectService::new(
            Arc::clone(&projects),
            Arc::clone(&sprints),
            Arc::clone(&tasks),
            Arc::clone(&lists),
            Arc::clone(&clock),
        );
        let sprint_service = SprintService::new(
            Arc::clone(&sprints),
            Arc::clone(&projects),
            Arc::clone(&tasks),
            Arc::clone(&lists),
            Arc::clone(&clock),
        );
        let list_service = ActionListService::new(
            Arc::clone(&lists),
            Arc::clone(&projects),
            Arc::clone(&sprints),
            clock,
        );

        Self {
            tasks,
            projects,
            sprints,
            lists,
            task_service,
            project_service,
            sprint_service,
            list_service,
        }
    }

    /// Seeds a project named after its id.
    pub(crate) async fn seed_project(&self, id: &str) -> DomainResult<Project> {
        self.project_service
            .create(CreateProjectRequest::new(id, format!("{id} project"), "alice"))
            .await
    }

    /// Seeds a two-week sprint under the given project.
    pub(crate) async fn seed_sprint(&self, id: &str, project_id: &str) -> DomainResult<Sprint> {
        self.sprint_service
            .create(CreateSprintRequest::new(
                id,
                Cadence::Biweekly,
                date(2026, 3, 2),
                date(2026, 3, 16),
                project_id,
            ))
            .await
    }

    /// Seeds a task under the given project and sprint.
    pub(crate) async fn seed_task(
        &self,
        id: &str,
        project_id: &str,
        sprint_id: &str,
    ) -> DomainResult<Task> {
        self.task_service
            .create(CreateTaskRequest::new(
                id,
                format!("{id} title"),
                "bob",
                project_id,
                sprint_id,
            ))
            .await
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
