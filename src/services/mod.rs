//! Application services orchestrating aggregates across repositories.
//!
//! Each service owns `Arc` handles to the repositories it coordinates
//! plus a clock for timestamps, and exposes the use-case operations the
//! boundary layer calls. Cross-aggregate bookkeeping (sprint and
//! project registries, cascade deletion, action-list soft-detachment)
//! lives here rather than in the adapters.

mod action_list;
mod project;
mod sprint;
mod task;

pub use action_list::{ActionListService, CreateActionListRequest};
pub use project::{CreateProjectRequest, ProjectService};
pub use sprint::{CreateSprintRequest, SprintService};
pub use task::{CreateTaskRequest, TaskService, TaskUpdate};

use crate::domain::{ActionList, ActionListPatch, DomainResult};
use crate::ports::ActionListRepository;
use chrono::{DateTime, Utc};

/// Soft-detaches action lists from a deleted sprint: the sprint link is
/// nulled and `parent_deleted_at` is stamped, hiding the lists from
/// default listings without destroying them.
async fn detach_lists<L: ActionListRepository>(
    lists: &L,
    linked: Vec<ActionList>,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    for list in linked {
        let patch = ActionListPatch {
            sprint_id: Some(None),
            parent_deleted_at: Some(Some(now)),
            ..ActionListPatch::default()
        };
        lists.update(list.id(), patch).await?;
    }
    Ok(())
}
