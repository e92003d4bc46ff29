//! Unit tests for identifiers, the error taxonomy, and derived metrics.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for assertion clarity"
)]

use crate::domain::{
    ActionItem, ActionList, ActionListId, ActionListPatch, ActionListStatus, Burndown, Cadence,
    DomainError, ErrorKind, HealthStatus, MAX_ID_LEN, NewActionList, NewSprint, ProjectHealth,
    ProjectId, Sprint, SprintId, SprintPatch, TaskId, TaskStatus,
};
use chrono::{NaiveDate, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use std::collections::BTreeMap;

use super::fixtures::date;

// ── Identifiers ─────────────────────────────────────────────────────

#[rstest]
#[case("T-1")]
#[case("T-feature_work-42")]
#[case("T-UPPER-and-lower")]
fn task_id_accepts_prefixed_values(#[case] raw: &str) {
    let id = TaskId::new(raw).expect("valid task id");
    assert_eq!(id.as_str(), raw);
}

#[rstest]
#[case("P-1")]
#[case("")]
#[case("T1")]
#[case("T-")]
#[case("T-has space")]
#[case("T-tab\there")]
fn task_id_rejects_malformed_values(#[case] raw: &str) {
    let err = TaskId::new(raw).expect_err("malformed task id");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn id_length_limit_is_inclusive() {
    let longest = format!("T-{}", "a".repeat(MAX_ID_LEN - 2));
    assert_eq!(longest.len(), MAX_ID_LEN);
    assert!(TaskId::new(longest).is_ok());

    let too_long = format!("T-{}", "a".repeat(MAX_ID_LEN - 1));
    assert!(TaskId::new(too_long).is_err());
}

#[rstest]
fn each_entity_has_its_own_prefix() {
    assert!(TaskId::new("T-1").is_ok());
    assert!(ProjectId::new("P-1").is_ok());
    assert!(SprintId::new("S-1").is_ok());
    assert!(ActionListId::new("L-1").is_ok());

    assert!(ProjectId::new("T-1").is_err());
    assert!(SprintId::new("L-1").is_err());
}

// ── Error taxonomy ──────────────────────────────────────────────────

#[rstest]
#[case(ErrorKind::NotFound, 404, "not_found")]
#[case(ErrorKind::Validation, 422, "validation")]
#[case(ErrorKind::Conflict, 409, "conflict")]
#[case(ErrorKind::Database, 500, "database")]
#[case(ErrorKind::Authorization, 403, "authorization")]
#[case(ErrorKind::Authentication, 401, "authentication")]
#[case(ErrorKind::Concurrency, 409, "concurrency")]
fn error_kinds_map_to_http_statuses(
    #[case] kind: ErrorKind,
    #[case] status: u16,
    #[case] code: &str,
) {
    assert_eq!(kind.http_status(), status);
    assert_eq!(kind.code(), code);
}

#[rstest]
fn problem_details_carry_kind_and_message() {
    let err = DomainError::not_found("task", "T-9");
    let problem = err.to_problem("/tasks/T-9");

    assert_eq!(problem.problem_type, "urn:backlog:error:not_found");
    assert_eq!(problem.title, "Resource Not Found");
    assert_eq!(problem.status, 404);
    assert_eq!(problem.detail, "task 'T-9' not found");
    assert_eq!(problem.instance, "/tasks/T-9");
}

#[rstest]
fn domain_error_display_names_the_kind() {
    let err = DomainError::validation("owner must not be empty");
    assert_eq!(err.to_string(), "validation: owner must not be empty");
}

// ── Project health ──────────────────────────────────────────────────

fn counts(entries: &[(TaskStatus, u64)]) -> BTreeMap<TaskStatus, u64> {
    entries.iter().copied().collect()
}

#[rstest]
fn zero_task_project_is_green() {
    let health = ProjectHealth::from_counts(BTreeMap::new(), Utc::now());
    assert_eq!(health.total_tasks, 0);
    assert!((health.completion_pct - 0.0).abs() < f64::EPSILON);
    assert!((health.blocked_pct - 0.0).abs() < f64::EPSILON);
    assert_eq!(health.health_status, HealthStatus::Green);
}

#[rstest]
// 3 of 10 blocked puts blocked_pct at 30, past the red line.
#[case(&[(TaskStatus::Blocked, 3), (TaskStatus::Done, 7)], HealthStatus::Red)]
// 2 of 10 blocked is 20 exactly, which is not past the red line; it is
// past the yellow line.
#[case(&[(TaskStatus::Blocked, 2), (TaskStatus::Done, 8)], HealthStatus::Yellow)]
// Nothing blocked but only 2 of 10 done: completion below 30.
#[case(&[(TaskStatus::Done, 2), (TaskStatus::InProgress, 8)], HealthStatus::Yellow)]
// 1 of 10 blocked and 5 done: under every threshold.
#[case(&[(TaskStatus::Blocked, 1), (TaskStatus::Done, 5), (TaskStatus::Ready, 4)], HealthStatus::Green)]
fn health_classification_follows_thresholds(
    #[case] histogram: &[(TaskStatus, u64)],
    #[case] expected: HealthStatus,
) {
    let health = ProjectHealth::from_counts(counts(histogram), Utc::now());
    assert_eq!(health.health_status, expected);
}

#[rstest]
fn health_percentages_are_out_of_one_hundred() {
    let health = ProjectHealth::from_counts(
        counts(&[(TaskStatus::Done, 3), (TaskStatus::New, 1)]),
        Utc::now(),
    );
    assert!((health.completion_pct - 75.0).abs() < f64::EPSILON);
}

// ── Sprint dates and burndown ───────────────────────────────────────

fn sprint_over(start: NaiveDate, end: NaiveDate) -> Sprint {
    let draft = NewSprint {
        id: SprintId::new("S-1").expect("valid sprint id"),
        cadence: Cadence::Biweekly,
        start_date: start,
        end_date: end,
        primary_project: ProjectId::new("P-1").expect("valid project id"),
        committed_points: 20,
    };
    Sprint::new(draft, &DefaultClock).expect("valid date range")
}

#[rstest]
fn sprint_rejects_inverted_range() {
    let draft = NewSprint {
        id: SprintId::new("S-1").expect("valid sprint id"),
        cadence: Cadence::Weekly,
        start_date: date(2026, 3, 9),
        end_date: date(2026, 3, 2),
        primary_project: ProjectId::new("P-1").expect("valid project id"),
        committed_points: 0,
    };
    let err = Sprint::new(draft, &DefaultClock).expect_err("inverted range");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn sprint_patch_revalidates_range() {
    let mut sprint = sprint_over(date(2026, 3, 2), date(2026, 3, 16));
    let patch = SprintPatch {
        end_date: Some(date(2026, 3, 1)),
        ..SprintPatch::default()
    };
    assert!(sprint.apply_patch(patch, Utc::now()).is_err());
    assert_eq!(sprint.end_date(), date(2026, 3, 16), "range unchanged");
}

#[rstest]
fn burndown_rejects_zero_day_sprint() {
    let sprint = sprint_over(date(2026, 3, 2), date(2026, 3, 2));
    let err = Burndown::derive(&sprint, 10, 0, date(2026, 3, 2)).expect_err("zero-day range");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn burndown_day_zero_is_on_track_with_zero_rate() {
    let sprint = sprint_over(date(2026, 3, 2), date(2026, 3, 16));
    let report = Burndown::derive(&sprint, 28, 0, date(2026, 3, 2)).expect("valid sprint");

    assert_eq!(report.days_elapsed, 0);
    assert!((report.actual_rate - 0.0).abs() < f64::EPSILON);
    assert!(report.on_track);
}

#[rstest]
fn burndown_clamps_elapsed_to_sprint_bounds() {
    let sprint = sprint_over(date(2026, 3, 2), date(2026, 3, 16));

    let before = Burndown::derive(&sprint, 14, 0, date(2026, 2, 1)).expect("valid sprint");
    assert_eq!(before.days_elapsed, 0);

    let after = Burndown::derive(&sprint, 14, 14, date(2026, 4, 1)).expect("valid sprint");
    assert_eq!(after.days_elapsed, 14);
}

#[rstest]
fn burndown_compares_actual_against_ideal_rate() {
    // 14-day sprint, 14 points: ideal rate is one point per day.
    let sprint = sprint_over(date(2026, 3, 2), date(2026, 3, 16));

    let behind = Burndown::derive(&sprint, 14, 3, date(2026, 3, 9)).expect("valid sprint");
    assert_eq!(behind.days_elapsed, 7);
    assert!(!behind.on_track);
    assert_eq!(behind.remaining_points, 11);

    let ahead = Burndown::derive(&sprint, 14, 9, date(2026, 3, 9)).expect("valid sprint");
    assert!(ahead.on_track);
}

// ── Action list soft delete ─────────────────────────────────────────

#[rstest]
fn clearing_a_parent_link_marks_soft_deletion() {
    let draft = NewActionList {
        id: ActionListId::new("L-1").expect("valid list id"),
        status: ActionListStatus::Active,
        project_id: Some(ProjectId::new("P-1").expect("valid project id")),
        sprint_id: None,
        items: vec![ActionItem::open("write release notes")],
    };
    let mut list = ActionList::new(draft, &DefaultClock);
    assert!(!list.is_soft_deleted());

    let now = Utc::now();
    let patch = ActionListPatch {
        project_id: Some(None),
        parent_deleted_at: Some(Some(now)),
        ..ActionListPatch::default()
    };
    list.apply_patch(patch, now).expect("patch applies");

    assert!(list.is_soft_deleted());
    assert_eq!(list.project_id(), None);
    assert_eq!(list.parent_deleted_at(), Some(now));
}
