//! Sprint aggregate root, cadence vocabulary, and burndown report.

use super::{DomainError, DomainResult, ProjectId, SprintId, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Sprint cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// One-week sprints.
    Weekly,
    /// Two-week sprints.
    Biweekly,
    /// Month-long sprints.
    Monthly,
}

impl Cadence {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Validated input for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSprint {
    /// Caller-supplied sprint identifier.
    pub id: SprintId,
    /// Sprint cadence.
    pub cadence: Cadence,
    /// First day of the sprint.
    pub start_date: NaiveDate,
    /// Last day of the sprint.
    pub end_date: NaiveDate,
    /// Required primary project.
    pub primary_project: ProjectId,
    /// Points committed at planning time.
    pub committed_points: u32,
}

/// Partial update applied to an existing sprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintPatch {
    /// New cadence.
    pub cadence: Option<Cadence>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// New committed points.
    pub committed_points: Option<u32>,
    /// New delivered points.
    pub actual_points: Option<u32>,
    /// Refreshed velocity.
    pub velocity: Option<u32>,
    /// Replacement task-id collection.
    pub task_ids: Option<Vec<TaskId>>,
}

/// Sprint aggregate root. Deleting a sprint cascade-deletes its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    id: SprintId,
    cadence: Cadence,
    start_date: NaiveDate,
    end_date: NaiveDate,
    primary_project: ProjectId,
    committed_points: u32,
    actual_points: u32,
    velocity: Option<u32>,
    task_ids: Vec<TaskId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a new sprint with an empty task collection.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when `end_date` precedes
    /// `start_date`.
    pub fn new(draft: NewSprint, clock: &impl Clock) -> DomainResult<Self> {
        validate_range(draft.start_date, draft.end_date)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: draft.id,
            cadence: draft.cadence,
            start_date: draft.start_date,
            end_date: draft.end_date,
            primary_project: draft.primary_project,
            committed_points: draft.committed_points,
            actual_points: 0,
            velocity: None,
            task_ids: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> &SprintId {
        &self.id
    }

    /// Returns the cadence.
    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Returns the first day of the sprint.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last day of the sprint.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns the required primary project.
    #[must_use]
    pub const fn primary_project(&self) -> &ProjectId {
        &self.primary_project
    }

    /// Returns the points committed at planning time.
    #[must_use]
    pub const fn committed_points(&self) -> u32 {
        self.committed_points
    }

    /// Returns the delivered points.
    #[must_use]
    pub const fn actual_points(&self) -> u32 {
        self.actual_points
    }

    /// Returns the last computed velocity, if any.
    #[must_use]
    pub const fn velocity(&self) -> Option<u32> {
        self.velocity
    }

    /// Returns the task-id collection.
    #[must_use]
    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
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

    /// Returns the whole-day length of the sprint.
    #[must_use]
    pub fn days_total(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Applies a partial update, re-validating the date range when
    /// either bound changes.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the resulting `end_date`
    /// precedes the resulting `start_date`.
    pub fn apply_patch(&mut self, patch: SprintPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        validate_range(start, end)?;
        self.start_date = start;
        self.end_date = end;
        if let Some(cadence) = patch.cadence {
            self.cadence = cadence;
        }
        if let Some(committed) = patch.committed_points {
            self.committed_points = committed;
        }
        if let Some(actual) = patch.actual_points {
            self.actual_points = actual;
        }
        if let Some(velocity) = patch.velocity {
            self.velocity = Some(velocity);
        }
        if let Some(task_ids) = patch.task_ids {
            self.task_ids = task_ids;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> DomainResult<()> {
    if end < start {
        return Err(DomainError::validation(format!(
            "sprint end date {end} precedes start date {start}"
        )));
    }
    Ok(())
}

/// Point-in-time burndown report for a sprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Burndown {
    /// Sprint the report describes.
    pub sprint_id: SprintId,
    /// Estimate points across all sprint tasks.
    pub total_points: u32,
    /// Estimate points across done sprint tasks.
    pub completed_points: u32,
    /// Points still open (`total - completed`).
    pub remaining_points: u32,
    /// Whole-day sprint length.
    pub days_total: i64,
    /// Whole days elapsed, clamped to `[0, days_total]`.
    pub days_elapsed: i64,
    /// Points per day required to finish on time.
    pub ideal_rate: f64,
    /// Points per day actually completed (0.0 on day zero).
    pub actual_rate: f64,
    /// Whether the sprint is at or ahead of the ideal rate. Defined as
    /// `true` on day zero: a sprint cannot be behind before any time
    /// has elapsed.
    pub on_track: bool,
}

impl Burndown {
    /// Derives a burndown report from point totals and elapsed time.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when `days_total` is zero (a
    /// degenerate single-day range is rejected rather than producing an
    /// infinite rate).
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "burndown rates are advisory ratios, not exact accounting"
    )]
    pub fn derive(
        sprint: &Sprint,
        total_points: u32,
        completed_points: u32,
        today: NaiveDate,
    ) -> DomainResult<Self> {
        let days_total = sprint.days_total();
        if days_total == 0 {
            return Err(DomainError::validation(format!(
                "sprint '{}' has a zero-day date range; burndown is undefined",
                sprint.id()
            )));
        }

        let elapsed = (today - sprint.start_date()).num_days();
        let days_elapsed = elapsed.clamp(0, days_total);
        let remaining_points = total_points.saturating_sub(completed_points);
        let ideal_rate = f64::from(total_points) / days_total as f64;

        let (actual_rate, on_track) = if days_elapsed == 0 {
            (0.0, true)
        } else {
            let rate = f64::from(completed_points) / days_elapsed as f64;
            (rate, rate >= ideal_rate)
        };

        Ok(Self {
            sprint_id: sprint.id().clone(),
            total_points,
            completed_points,
            remaining_points,
            days_total,
            days_elapsed,
            ideal_rate,
            actual_rate,
            on_track,
        })
    }
}
