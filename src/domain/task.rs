//! Task aggregate root, status state machine, and task vocabularies.

use super::{DomainError, DomainResult, ProjectId, SprintId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task lifecycle status governed by the transition table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been captured but not yet groomed.
    New,
    /// Task is groomed and ready to be picked up.
    Ready,
    /// Task is being worked on.
    InProgress,
    /// Task is waiting on an external blocker.
    Blocked,
    /// Task is awaiting review.
    Review,
    /// Task is complete (terminal).
    Done,
    /// Task was abandoned (terminal).
    Dropped,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Review => "review",
            Self::Done => "done",
            Self::Dropped => "dropped",
        }
    }

    /// Returns true when no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Dropped)
    }

    /// Returns the statuses reachable from this one.
    #[must_use]
    pub const fn valid_transitions(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Ready, Self::Dropped],
            Self::Ready => &[Self::InProgress, Self::Dropped],
            Self::InProgress => &[Self::Blocked, Self::Review, Self::Done, Self::Dropped],
            Self::Blocked => &[Self::InProgress, Self::Dropped],
            Self::Review => &[Self::InProgress, Self::Done, Self::Dropped],
            Self::Done | Self::Dropped => &[],
        }
    }

    /// Returns true when `next` is a listed edge from this status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            "dropped" => Ok(Self::Dropped),
            _ => Err(ParseEnumError::new("task status", value)),
        }
    }
}

/// Error returned while parsing closed vocabularies from storage.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown {vocabulary}: {value}")]
pub struct ParseEnumError {
    /// The vocabulary that rejected the value.
    pub vocabulary: &'static str,
    /// The rejected raw value.
    pub value: String,
}

impl ParseEnumError {
    fn new(vocabulary: &'static str, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_owned(),
        }
    }
}

/// Scheduling priority, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Default priority.
    Medium,
    /// Should be scheduled ahead of medium work.
    High,
    /// Drop everything.
    Critical,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseEnumError::new("priority", value)),
        }
    }
}

/// Impact severity of the underlying problem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic.
    Trivial,
    /// Noticeable but workaround exists.
    Minor,
    /// Significant functional impact.
    Major,
    /// Data loss or outage.
    Critical,
}

impl Severity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

/// A single acceptance criterion on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    /// What must hold for the task to be accepted.
    pub text: String,
    /// Whether the criterion has been met.
    pub met: bool,
}

/// A named quality gate on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityGate {
    /// Gate name (for example `lint`, `coverage`).
    pub name: String,
    /// Whether the gate has passed.
    pub passed: bool,
}

/// Append-only audit trail entry recorded against a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAction {
    /// Entry identifier.
    pub id: Uuid,
    /// When the action happened.
    pub at: DateTime<Utc>,
    /// Who performed the action, when known.
    pub actor: Option<String>,
    /// What happened.
    pub detail: String,
}

impl TaskAction {
    fn record(at: DateTime<Utc>, actor: Option<String>, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            at,
            actor,
            detail: detail.into(),
        }
    }
}

/// Validated input for creating a task.
///
/// New tasks always enter the state machine at [`TaskStatus::New`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Caller-supplied task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Scheduling priority.
    pub priority: Priority,
    /// Impact severity.
    pub severity: Severity,
    /// Owning user.
    pub owner: String,
    /// Required primary project.
    pub primary_project: ProjectId,
    /// Required primary sprint.
    pub primary_sprint: SprintId,
    /// Estimate in points, when sized.
    pub estimate: Option<u32>,
    /// Additional projects this task relates to.
    pub related_projects: Vec<ProjectId>,
    /// Additional sprints this task relates to.
    pub related_sprints: Vec<SprintId>,
    /// Parent tasks.
    pub parents: Vec<TaskId>,
    /// Tasks this task depends on (unvalidated, no cycle detection).
    pub depends_on: Vec<TaskId>,
    /// Tasks this task blocks (unvalidated, no cycle detection).
    pub blocks: Vec<TaskId>,
    /// Tasks currently blocking this one.
    pub blockers: Vec<TaskId>,
    /// Acceptance criteria.
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    /// Quality gates.
    pub quality_gates: Vec<QualityGate>,
}

/// Partial update applied to an existing task.
///
/// Only supplied fields are applied. A supplied `status` is validated
/// against the transition table and recorded in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// Requested status transition.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New severity.
    pub severity: Option<Severity>,
    /// New owner.
    pub owner: Option<String>,
    /// New estimate in points.
    pub estimate: Option<u32>,
    /// New primary project.
    pub primary_project: Option<ProjectId>,
    /// New primary sprint.
    pub primary_sprint: Option<SprintId>,
    /// Replacement related-project set.
    pub related_projects: Option<Vec<ProjectId>>,
    /// Replacement related-sprint set.
    pub related_sprints: Option<Vec<SprintId>>,
    /// Replacement parent set.
    pub parents: Option<Vec<TaskId>>,
    /// Replacement depends-on set.
    pub depends_on: Option<Vec<TaskId>>,
    /// Replacement blocks set.
    pub blocks: Option<Vec<TaskId>>,
    /// Replacement blocker set.
    pub blockers: Option<Vec<TaskId>>,
    /// Replacement acceptance criteria.
    pub acceptance_criteria: Option<Vec<AcceptanceCriterion>>,
    /// Replacement quality gates.
    pub quality_gates: Option<Vec<QualityGate>>,
    /// Actor attributed in audit entries produced by this patch.
    pub actor: Option<String>,
}

impl TaskPatch {
    /// Creates a patch that only requests a status transition.
    #[must_use]
    pub fn status_change(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    status: TaskStatus,
    priority: Priority,
    severity: Severity,
    owner: String,
    primary_project: ProjectId,
    primary_sprint: SprintId,
    estimate: Option<u32>,
    related_projects: Vec<ProjectId>,
    related_sprints: Vec<SprintId>,
    parents: Vec<TaskId>,
    depends_on: Vec<TaskId>,
    blocks: Vec<TaskId>,
    blockers: Vec<TaskId>,
    acceptance_criteria: Vec<AcceptanceCriterion>,
    quality_gates: Vec<QualityGate>,
    actions: Vec<TaskAction>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn require_non_empty(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("task {field} must not be empty")));
    }
    Ok(trimmed.to_owned())
}

impl Task {
    /// Creates a new task at [`TaskStatus::New`].
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the title or owner is empty.
    pub fn new(draft: NewTask, clock: &impl Clock) -> DomainResult<Self> {
        let timestamp = clock.utc();
        let title = require_non_empty(&draft.title, "title")?;
        let owner = require_non_empty(&draft.owner, "owner")?;
        let created = TaskAction::record(timestamp, None, "task created");

        Ok(Self {
            id: draft.id,
            title,
            status: TaskStatus::New,
            priority: draft.priority,
            severity: draft.severity,
            owner,
            primary_project: draft.primary_project,
            primary_sprint: draft.primary_sprint,
            estimate: draft.estimate,
            related_projects: draft.related_projects,
            related_sprints: draft.related_sprints,
            parents: draft.parents,
            depends_on: draft.depends_on,
            blocks: draft.blocks,
            blockers: draft.blockers,
            acceptance_criteria: draft.acceptance_criteria,
            quality_gates: draft.quality_gates,
            actions: vec![created],
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the impact severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the owning user.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the required primary project.
    #[must_use]
    pub const fn primary_project(&self) -> &ProjectId {
        &self.primary_project
    }

    /// Returns the required primary sprint.
    #[must_use]
    pub const fn primary_sprint(&self) -> &SprintId {
        &self.primary_sprint
    }

    /// Returns the estimate in points, when sized.
    #[must_use]
    pub const fn estimate(&self) -> Option<u32> {
        self.estimate
    }

    /// Returns the related projects.
    #[must_use]
    pub fn related_projects(&self) -> &[ProjectId] {
        &self.related_projects
    }

    /// Returns the related sprints.
    #[must_use]
    pub fn related_sprints(&self) -> &[SprintId] {
        &self.related_sprints
    }

    /// Returns the parent tasks.
    #[must_use]
    pub fn parents(&self) -> &[TaskId] {
        &self.parents
    }

    /// Returns the tasks this task depends on.
    #[must_use]
    pub fn depends_on(&self) -> &[TaskId] {
        &self.depends_on
    }

    /// Returns the tasks this task blocks.
    #[must_use]
    pub fn blocks(&self) -> &[TaskId] {
        &self.blocks
    }

    /// Returns the tasks currently blocking this one.
    #[must_use]
    pub fn blockers(&self) -> &[TaskId] {
        &self.blockers
    }

    /// Returns the acceptance criteria.
    #[must_use]
    pub fn acceptance_criteria(&self) -> &[AcceptanceCriterion] {
        &self.acceptance_criteria
    }

    /// Returns the quality gates.
    #[must_use]
    pub fn quality_gates(&self) -> &[QualityGate] {
        &self.quality_gates
    }

    /// Returns the append-only audit trail.
    #[must_use]
    pub fn actions(&self) -> &[TaskAction] {
        &self.actions
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

    /// Applies a partial update, enforcing the status transition table.
    ///
    /// Status changes append an audit entry naming the transition. The
    /// `updated_at` stamp is set here and only here.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for an empty title/owner or an
    /// illegal `(current, requested)` status pair.
    pub fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(title) = &patch.title {
            self.title = require_non_empty(title, "title")?;
        }
        if let Some(owner) = &patch.owner {
            self.owner = require_non_empty(owner, "owner")?;
        }
        if let Some(next) = patch.status {
            self.transition_to(next, patch.actor.clone(), now)?;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(estimate) = patch.estimate {
            self.estimate = Some(estimate);
        }
        if let Some(project) = patch.primary_project {
            self.primary_project = project;
        }
        if let Some(sprint) = patch.primary_sprint {
            self.primary_sprint = sprint;
        }
        if let Some(related) = patch.related_projects {
            self.related_projects = related;
        }
        if let Some(related) = patch.related_sprints {
            self.related_sprints = related;
        }
        if let Some(parents) = patch.parents {
            self.parents = parents;
        }
        if let Some(depends_on) = patch.depends_on {
            self.depends_on = depends_on;
        }
        if let Some(blocks) = patch.blocks {
            self.blocks = blocks;
        }
        if let Some(blockers) = patch.blockers {
            self.blockers = blockers;
        }
        if let Some(criteria) = patch.acceptance_criteria {
            self.acceptance_criteria = criteria;
        }
        if let Some(gates) = patch.quality_gates {
            self.quality_gates = gates;
        }
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(
        &mut self,
        next: TaskStatus,
        actor: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "illegal status transition for task '{}': {} -> {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        let detail = format!("status: {} -> {}", self.status.as_str(), next.as_str());
        self.actions.push(TaskAction::record(now, actor, detail));
        self.status = next;
        Ok(())
    }
}
