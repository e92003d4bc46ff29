//! Service orchestration tests for project health and cascade deletion.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for assertion clarity"
)]

use crate::domain::{ErrorKind, HealthStatus, ProjectId, SprintId, TaskStatus};
use crate::ports::Repository;
use crate::services::CreateActionListRequest;
use rstest::{fixture, rstest};

use super::fixtures::Stage;

#[fixture]
fn stage() -> Stage {
    Stage::new()
}

fn project_id(raw: &str) -> ProjectId {
    ProjectId::new(raw).expect("valid project id")
}

fn sprint_id(raw: &str) -> SprintId {
    SprintId::new(raw).expect("valid sprint id")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_for_an_empty_project_are_green(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");

    let health = stage
        .project_service
        .metrics(&project_id("P-1"))
        .await
        .expect("metrics succeed");
    assert_eq!(health.total_tasks, 0);
    assert_eq!(health.health_status, HealthStatus::Green);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_count_tasks_and_persist_on_the_project(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    for id in ["T-1", "T-2", "T-3"] {
        stage.seed_task(id, "P-1", "S-1").await.expect("seed task");
    }

    let health = stage
        .project_service
        .metrics(&project_id("P-1"))
        .await
        .expect("metrics succeed");
    assert_eq!(health.total_tasks, 3);
    assert_eq!(health.status_counts.get(&TaskStatus::New), Some(&3));
    assert_eq!(
        health.health_status,
        HealthStatus::Yellow,
        "nothing done yet, completion below threshold"
    );

    let project = stage
        .project_service
        .get(&project_id("P-1"))
        .await
        .expect("get project");
    assert_eq!(project.health(), Some(&health), "snapshot persisted");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_and_remove_sprint_are_idempotent(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    let id = project_id("P-1");
    let sprint = sprint_id("S-1");

    // Sprint creation already registered S-1; adding again is a no-op.
    let project = stage
        .project_service
        .add_sprint(&id, &sprint)
        .await
        .expect("idempotent add");
    assert_eq!(project.sprint_ids(), &[sprint.clone()]);

    let removed = stage
        .project_service
        .remove_sprint(&id, &sprint)
        .await
        .expect("remove succeeds");
    assert!(removed.sprint_ids().is_empty());

    let removed_again = stage
        .project_service
        .remove_sprint(&id, &sprint)
        .await
        .expect("removing an absent sprint is a no-op");
    assert!(removed_again.sprint_ids().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_sprint_requires_the_sprint_to_exist(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");

    let err = stage
        .project_service
        .add_sprint(&project_id("P-1"), &sprint_id("S-9"))
        .await
        .expect_err("unknown sprint");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_without_force_is_rejected_while_children_exist(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    stage.seed_task("T-1", "P-1", "S-1").await.expect("seed task");

    let err = stage
        .project_service
        .delete(&project_id("P-1"), false)
        .await
        .expect_err("children exist");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert!(
        stage.project_service.get(&project_id("P-1")).await.is_ok(),
        "project survives the rejected delete"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forced_delete_cascades_and_soft_detaches_lists(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    stage.seed_task("T-1", "P-1", "S-1").await.expect("seed task");
    let list = stage
        .list_service
        .create(CreateActionListRequest::new("L-1").with_project("P-1"))
        .await
        .expect("create list");

    stage
        .project_service
        .delete(&project_id("P-1"), true)
        .await
        .expect("forced delete succeeds");

    assert_eq!(
        stage
            .project_service
            .get(&project_id("P-1"))
            .await
            .expect_err("project gone")
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(stage.tasks.count().await.expect("count"), 0);
    assert_eq!(stage.sprints.count().await.expect("count"), 0);

    // The action list survives, detached and hidden from default listings.
    let detached = stage.list_service.get(list.id()).await.expect("list kept");
    assert!(detached.is_soft_deleted());
    assert_eq!(detached.project_id(), None);

    let visible = stage.list_service.list(10, 0).await.expect("list_visible");
    assert_eq!(visible.total, 0);
    let deleted = stage.list_service.list_deleted().await.expect("list_deleted");
    assert_eq!(deleted.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forced_delete_detaches_lists_linked_only_to_owned_sprints(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    let list = stage
        .list_service
        .create(CreateActionListRequest::new("L-1").with_sprint("S-1"))
        .await
        .expect("create sprint-only list");

    stage
        .project_service
        .delete(&project_id("P-1"), true)
        .await
        .expect("forced delete succeeds");

    let detached = stage.list_service.get(list.id()).await.expect("list kept");
    assert!(
        detached.is_soft_deleted(),
        "sprint parent went with the project cascade"
    );
    assert_eq!(detached.sprint_id(), None);
    let deleted = stage.list_service.list_deleted().await.expect("list_deleted");
    assert_eq!(deleted.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forced_delete_removes_tasks_reaching_in_through_owned_sprints(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");
    stage.seed_sprint("S-1", "P-1").await.expect("seed sprint");
    stage.seed_project("P-2").await.expect("seed other project");
    // Primary project elsewhere, primary sprint about to be cascaded.
    stage.seed_task("T-1", "P-2", "S-1").await.expect("seed task");

    stage
        .project_service
        .delete(&project_id("P-1"), true)
        .await
        .expect("forced delete succeeds");

    assert_eq!(
        stage.tasks.count().await.expect("count"),
        0,
        "no task keeps a dangling sprint link"
    );
    assert!(
        stage.project_service.get(&project_id("P-2")).await.is_ok(),
        "the other project is untouched"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_of_an_empty_project_needs_no_force(stage: Stage) {
    stage.seed_project("P-1").await.expect("seed project");

    stage
        .project_service
        .delete(&project_id("P-1"), false)
        .await
        .expect("no children, plain delete succeeds");
}
