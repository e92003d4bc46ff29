//! Domain model for the task-tracking service layer.
//!
//! Pure business types with no infrastructure dependencies: the error
//! taxonomy, identifier newtypes, closed vocabularies, and the four
//! aggregate roots (Task, Project, Sprint, ActionList).

mod action_list;
mod error;
mod ids;
mod project;
mod sprint;
mod task;

pub use action_list::{
    ActionItem, ActionList, ActionListPatch, ActionListStatus, NewActionList,
};
pub use error::{DomainError, DomainResult, ErrorKind, ProblemDetails};
pub use ids::{ActionListId, MAX_ID_LEN, ProjectId, SprintId, TaskId};
pub use project::{
    HealthStatus, NewProject, Project, ProjectHealth, ProjectPatch, ProjectStatus,
};
pub use sprint::{Burndown, Cadence, NewSprint, Sprint, SprintPatch};
pub use task::{
    AcceptanceCriterion, NewTask, ParseEnumError, Priority, QualityGate, Severity, Task,
    TaskAction, TaskPatch, TaskStatus,
};
