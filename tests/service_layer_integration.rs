//! Behavioural integration tests for the service layer over the
//! in-memory adapters.
//!
//! These tests exercise the services through the public crate API in
//! realistic multi-entity flows: planning a sprint, working tasks
//! through the state machine, reading the derived metrics, and tearing
//! structures down with cascades.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "test code indexes after length assertions"
)]

use backlog::adapters::memory::{
    InMemoryActionListRepository, InMemoryProjectRepository, InMemorySprintRepository,
    InMemoryTaskRepository,
};
use backlog::domain::{
    ActionListId, Cadence, ErrorKind, HealthStatus, ProjectId, SprintId, TaskId, TaskStatus,
};
use backlog::services::{
    ActionListService, CreateActionListRequest, CreateProjectRequest, CreateSprintRequest,
    CreateTaskRequest, ProjectService, SprintService, TaskService,
};
use chrono::NaiveDate;
use eyre::ensure;
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Creates a tokio runtime for async operations in tests.
fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

struct Services {
    tasks: TaskService<
        InMemoryTaskRepository,
        InMemoryProjectRepository,
        InMemorySprintRepository,
        DefaultClock,
    >,
    projects: ProjectService<
        InMemoryProjectRepository,
        InMemorySprintRepository,
        InMemoryTaskRepository,
        InMemoryActionListRepository,
        DefaultClock,
    >,
    sprints: SprintService<
        InMemorySprintRepository,
        InMemoryProjectRepository,
        InMemoryTaskRepository,
        InMemoryActionListRepository,
        DefaultClock,
    >,
    lists: ActionListService<
        InMemoryActionListRepository,
        InMemoryProjectRepository,
        InMemorySprintRepository,
        DefaultClock,
    >,
}

fn wire_services() -> Services {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let projects = Arc::new(InMemoryProjectRepository::new());
    let sprints = Arc::new(InMemorySprintRepository::new());
    let lists = Arc::new(InMemoryActionListRepository::new());
    let clock = Arc::new(DefaultClock);

    Services {
        tasks: TaskService::new(
            Arc::clone(&tasks),
            Arc::clone(&projects),
            Arc::clone(&sprints),
            Arc::clone(&clock),
        ),
        projects: ProjectService::new(
            Arc::clone(&projects),
            Arc::clone(&sprints),
            Arc::clone(&tasks),
            Arc::clone(&lists),
            Arc::clone(&clock),
        ),
        sprints: SprintService::new(
            Arc::clone(&sprints),
            Arc::clone(&projects),
            Arc::clone(&tasks),
            Arc::clone(&lists),
            Arc::clone(&clock),
        ),
        lists: ActionListService::new(lists, projects, sprints, clock),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

fn task_id(raw: &str) -> TaskId {
    TaskId::new(raw).expect("valid task id")
}

/// Plans a sprint, works two tasks to done, and checks the derived
/// metrics the whole way down.
#[test]
fn sprint_planning_and_reporting_flow() -> eyre::Result<()> {
    let rt = test_runtime();
    let services = wire_services();

    rt.block_on(async {
        services
            .projects
            .create(CreateProjectRequest::new("P-web", "Web revamp", "alice"))
            .await?;
        services
            .sprints
            .create(
                CreateSprintRequest::new(
                    "S-web-1",
                    Cadence::Biweekly,
                    date(2026, 3, 2),
                    date(2026, 3, 16),
                    "P-web",
                )
                .with_committed_points(12),
            )
            .await?;

        // Two sized tasks and one unsized chore.
        for (id, estimate) in [("T-nav", Some(5)), ("T-footer", Some(3)), ("T-chore", None)] {
            let mut request =
                CreateTaskRequest::new(id, format!("{id} work"), "bob", "P-web", "S-web-1");
            if let Some(points) = estimate {
                request = request.with_estimate(points);
            }
            services.tasks.create(request).await?;
        }

        // Work the sized tasks to done.
        for id in ["T-nav", "T-footer"] {
            let id = task_id(id);
            for status in [TaskStatus::Ready, TaskStatus::InProgress, TaskStatus::Done] {
                services.tasks.change_status(&id, status).await?;
            }
        }

        let sprint_ref = SprintId::new("S-web-1")?;
        let velocity = services.sprints.velocity(&sprint_ref).await?;
        ensure!(velocity == 8, "5 + 3 done points, chore contributes zero");

        let burndown = services.sprints.burndown(&sprint_ref).await?;
        ensure!(burndown.total_points == 8);
        ensure!(burndown.completed_points == 8);
        ensure!(burndown.remaining_points == 0);

        let health = services.projects.metrics(&ProjectId::new("P-web")?).await?;
        ensure!(health.total_tasks == 3);
        ensure!(health.status_counts.get(&TaskStatus::Done) == Some(&2));
        Ok(())
    })
}

/// A blocked-heavy project reads red regardless of completion.
#[test]
fn blocked_tasks_drive_project_health_red() {
    let rt = test_runtime();
    let services = wire_services();

    rt.block_on(async {
        services
            .projects
            .create(CreateProjectRequest::new("P-api", "API", "alice"))
            .await
            .expect("create project");
        services
            .sprints
            .create(CreateSprintRequest::new(
                "S-api-1",
                Cadence::Biweekly,
                date(2026, 3, 2),
                date(2026, 3, 16),
                "P-api",
            ))
            .await
            .expect("create sprint");

        for id in ["T-a", "T-b", "T-c", "T-d"] {
            services
                .tasks
                .create(CreateTaskRequest::new(
                    id,
                    format!("{id} work"),
                    "bob",
                    "P-api",
                    "S-api-1",
                ))
                .await
                .expect("create task");
        }
        // Block one of four tasks: 25% blocked is past the red line.
        let blocked = task_id("T-a");
        for status in [TaskStatus::Ready, TaskStatus::InProgress, TaskStatus::Blocked] {
            services
                .tasks
                .change_status(&blocked, status)
                .await
                .expect("listed transition");
        }

        let health = services
            .projects
            .metrics(&ProjectId::new("P-api").expect("valid project id"))
            .await
            .expect("metrics");
        assert_eq!(health.health_status, HealthStatus::Red);

        let found = services.tasks.blocked_tasks().await.expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), &blocked);
    });
}

/// Deleting a project cascades to tasks and sprints but only detaches
/// action lists, which stay reachable through the recovery query.
#[test]
fn project_teardown_cascades_and_preserves_lists() {
    let rt = test_runtime();
    let services = wire_services();

    rt.block_on(async {
        services
            .projects
            .create(CreateProjectRequest::new("P-old", "Legacy", "alice"))
            .await
            .expect("create project");
        services
            .sprints
            .create(CreateSprintRequest::new(
                "S-old-1",
                Cadence::Biweekly,
                date(2026, 3, 2),
                date(2026, 3, 16),
                "P-old",
            ))
            .await
            .expect("create sprint");
        services
            .tasks
            .create(CreateTaskRequest::new(
                "T-old",
                "Leftover work",
                "bob",
                "P-old",
                "S-old-1",
            ))
            .await
            .expect("create task");
        services
            .lists
            .create(
                CreateActionListRequest::new("L-migration")
                    .with_project("P-old")
                    .with_items(["export data".to_owned(), "archive repo".to_owned()]),
            )
            .await
            .expect("create list");

        let project_ref = ProjectId::new("P-old").expect("valid project id");
        let refused = services
            .projects
            .delete(&project_ref, false)
            .await
            .expect_err("children exist");
        assert_eq!(refused.kind(), ErrorKind::Conflict);

        services
            .projects
            .delete(&project_ref, true)
            .await
            .expect("forced delete");

        assert_eq!(
            services
                .tasks
                .get(&task_id("T-old"))
                .await
                .expect_err("task cascaded")
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            services
                .sprints
                .get(&SprintId::new("S-old-1").expect("valid sprint id"))
                .await
                .expect_err("sprint cascaded")
                .kind(),
            ErrorKind::NotFound
        );

        let list_ref = ActionListId::new("L-migration").expect("valid list id");
        let detached = services.lists.get(&list_ref).await.expect("list kept");
        assert!(detached.is_soft_deleted());
        assert_eq!(detached.project_id(), None);
        assert_eq!(detached.items().len(), 2, "items survive detachment");

        let deleted = services.lists.list_deleted().await.expect("recovery query");
        assert_eq!(deleted.len(), 1);
    });
}
