//! Repository contract tests against the in-memory adapter.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "test code indexes after length assertions"
)]

use crate::adapters::memory::{InMemoryActionListRepository, InMemoryTaskRepository};
use crate::domain::{
    ActionList, ActionListId, ActionListPatch, ActionListStatus, ErrorKind, NewActionList,
    NewTask, Priority, ProjectId, Severity, SprintId, Task, TaskId, TaskPatch, TaskStatus,
};
use crate::ports::{ActionListRepository, Repository, TaskFilter, TaskRepository};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

fn make_task(id: &str, priority: Priority, owner: &str) -> Task {
    let draft = NewTask {
        id: TaskId::new(id).expect("valid task id"),
        title: format!("{id} title"),
        priority,
        severity: Severity::Minor,
        owner: owner.to_owned(),
        primary_project: ProjectId::new("P-1").expect("valid project id"),
        primary_sprint: SprintId::new("S-1").expect("valid sprint id"),
        estimate: None,
        related_projects: Vec::new(),
        related_sprints: Vec::new(),
        parents: Vec::new(),
        depends_on: Vec::new(),
        blocks: Vec::new(),
        blockers: Vec::new(),
        acceptance_criteria: Vec::new(),
        quality_gates: Vec::new(),
    };
    Task::new(draft, &DefaultClock).expect("valid task draft")
}

#[fixture]
fn repo() -> InMemoryTaskRepository {
    InMemoryTaskRepository::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_then_get_round_trips(repo: InMemoryTaskRepository) {
    let task = make_task("T-1", Priority::Medium, "alice");
    let stored = repo.create(task.clone()).await.expect("create succeeds");
    assert_eq!(stored, task);

    let loaded = repo.get(task.id()).await.expect("get succeeds");
    assert_eq!(loaded, task);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_create_is_a_conflict(repo: InMemoryTaskRepository) {
    let task = make_task("T-1", Priority::Medium, "alice");
    repo.create(task.clone()).await.expect("first create");

    let err = repo.create(task).await.expect_err("second create");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.message(), "task 'T-1' already exists");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_id_is_not_found(repo: InMemoryTaskRepository) {
    let id = TaskId::new("T-missing").expect("valid task id");

    let get_err = repo.get(&id).await.expect_err("get misses");
    assert_eq!(get_err.kind(), ErrorKind::NotFound);

    let update_err = repo
        .update(&id, TaskPatch::default())
        .await
        .expect_err("update misses");
    assert_eq!(update_err.kind(), ErrorKind::NotFound);

    let delete_err = repo.delete(&id).await.expect_err("delete misses");
    assert_eq!(delete_err.kind(), ErrorKind::NotFound);

    assert!(!repo.exists(&id).await.expect("exists succeeds"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_applies_patch_and_persists(repo: InMemoryTaskRepository) {
    let task = make_task("T-1", Priority::Medium, "alice");
    repo.create(task.clone()).await.expect("create");

    let patch = TaskPatch {
        owner: Some("bob".to_owned()),
        priority: Some(Priority::High),
        ..TaskPatch::default()
    };
    let updated = repo.update(task.id(), patch).await.expect("update");
    assert_eq!(updated.owner(), "bob");
    assert_eq!(updated.priority(), Priority::High);

    let reloaded = repo.get(task.id()).await.expect("get");
    assert_eq!(reloaded, updated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_patch_leaves_entity_untouched(repo: InMemoryTaskRepository) {
    let task = make_task("T-1", Priority::Medium, "alice");
    repo.create(task.clone()).await.expect("create");

    let patch = TaskPatch {
        owner: Some("bob".to_owned()),
        status: Some(TaskStatus::Done),
        ..TaskPatch::default()
    };
    repo.update(task.id(), patch)
        .await
        .expect_err("new -> done is illegal");

    let reloaded = repo.get(task.id()).await.expect("get");
    assert_eq!(reloaded.owner(), "alice", "partial patch must not stick");
    assert_eq!(reloaded.status(), TaskStatus::New);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_is_id_ordered_and_paginated(repo: InMemoryTaskRepository) {
    for id in ["T-3", "T-1", "T-2"] {
        repo.create(make_task(id, Priority::Medium, "alice"))
            .await
            .expect("create");
    }

    let first = repo.list(2, 0).await.expect("first page");
    assert_eq!(first.total, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].id().as_str(), "T-1");
    assert_eq!(first.items[1].id().as_str(), "T-2");

    let second = repo.list(2, 2).await.expect("second page");
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id().as_str(), "T-3");

    let beyond = repo.list(2, 10).await.expect("page past the end");
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_listing_is_ok_not_an_error(repo: InMemoryTaskRepository) {
    let page = repo.list(10, 0).await.expect("list succeeds");
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(repo.count().await.expect("count succeeds"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_combines_filters_conjunctively(repo: InMemoryTaskRepository) {
    repo.create(make_task("T-1", Priority::High, "alice"))
        .await
        .expect("create");
    repo.create(make_task("T-2", Priority::High, "bob"))
        .await
        .expect("create");
    repo.create(make_task("T-3", Priority::Low, "alice"))
        .await
        .expect("create");

    let filter = TaskFilter::new()
        .with_priority(Priority::High)
        .with_owner("alice");
    let found = repo.search(&filter).await.expect("search succeeds");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id().as_str(), "T-1");

    let none = repo
        .search(&TaskFilter::new().with_owner("carol"))
        .await
        .expect("search succeeds");
    assert!(none.is_empty(), "zero matches is Ok, not NotFound");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn visibility_queries_split_on_soft_deletion() {
    let repo = InMemoryActionListRepository::new();
    for id in ["L-1", "L-2"] {
        let draft = NewActionList {
            id: ActionListId::new(id).expect("valid list id"),
            status: ActionListStatus::Active,
            project_id: None,
            sprint_id: None,
            items: Vec::new(),
        };
        repo.create(ActionList::new(draft, &DefaultClock))
            .await
            .expect("create");
    }

    let detach = ActionListPatch {
        parent_deleted_at: Some(Some(Utc::now())),
        ..ActionListPatch::default()
    };
    let deleted_id = ActionListId::new("L-1").expect("valid list id");
    repo.update(&deleted_id, detach).await.expect("soft delete");

    let visible = repo.list_visible(10, 0).await.expect("list_visible");
    assert_eq!(visible.total, 1);
    assert_eq!(visible.items[0].id().as_str(), "L-2");

    let deleted = repo.list_deleted().await.expect("list_deleted");
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].id().as_str(), "L-1");

    // Soft-deleted lists stay retrievable by id.
    assert!(repo.get(&deleted_id).await.is_ok());
}
