//! Action list service: ordered item manipulation and soft-delete
//! visibility.

use crate::domain::{
    ActionItem, ActionList, ActionListId, ActionListPatch, ActionListStatus, DomainError,
    DomainResult, ErrorKind, NewActionList, Project, ProjectId, SprintId,
};
use crate::ports::{ActionListRepository, Page, Repository, SprintRepository};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Request payload for creating an action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateActionListRequest {
    id: String,
    project_id: Option<String>,
    sprint_id: Option<String>,
    items: Vec<String>,
}

impl CreateActionListRequest {
    /// Creates a request for a free-standing list.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: None,
            sprint_id: None,
            items: Vec::new(),
        }
    }

    /// Links the list to a project.
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Links the list to a sprint.
    #[must_use]
    pub fn with_sprint(mut self, sprint_id: impl Into<String>) -> Self {
        self.sprint_id = Some(sprint_id.into());
        self
    }

    /// Seeds the list with open items in the given order.
    #[must_use]
    pub fn with_items(mut self, items: impl IntoIterator<Item = String>) -> Self {
        self.items = items.into_iter().collect();
        self
    }
}

/// Action list orchestration service.
#[derive(Clone)]
pub struct ActionListService<L, P, S, C>
where
    L: ActionListRepository,
    P: Repository<Project>,
    S: SprintRepository,
    C: Clock + Send + Sync,
{
    lists: Arc<L>,
    projects: Arc<P>,
    sprints: Arc<S>,
    clock: Arc<C>,
}

impl<L, P, S, C> ActionListService<L, P, S, C>
where
    L: ActionListRepository,
    P: Repository<Project>,
    S: SprintRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new action list service.
    #[must_use]
    pub const fn new(lists: Arc<L>, projects: Arc<P>, sprints: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            lists,
            projects,
            sprints,
            clock,
        }
    }

    /// Creates an action list, validating any supplied parent links.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed id or an unresolved parent
    /// link and `Conflict` when the id is already taken.
    pub async fn create(&self, request: CreateActionListRequest) -> DomainResult<ActionList> {
        let id = ActionListId::new(request.id)?;
        let project_id = match request.project_id {
            Some(raw) => {
                let project_id = ProjectId::new(raw)?;
                self.ensure_project(&project_id).await?;
                Some(project_id)
            }
            None => None,
        };
        let sprint_id = match request.sprint_id {
            Some(raw) => {
                let sprint_id = SprintId::new(raw)?;
                self.ensure_sprint(&sprint_id).await?;
                Some(sprint_id)
            }
            None => None,
        };

        let draft = NewActionList {
            id,
            status: ActionListStatus::Active,
            project_id,
            sprint_id,
            items: request.items.into_iter().map(ActionItem::open).collect(),
        };
        let list = ActionList::new(draft, &*self.clock);
        self.lists.create(list).await
    }

    /// Loads an action list by id. Soft-deleted lists remain
    /// retrievable here.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the list does not exist.
    pub async fn get(&self, id: &ActionListId) -> DomainResult<ActionList> {
        self.lists.get(id).await
    }

    /// Applies a partial update, validating any reassigned parent
    /// links.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing list and `Validation` for an
    /// unresolved parent link.
    pub async fn update(
        &self,
        id: &ActionListId,
        patch: ActionListPatch,
    ) -> DomainResult<ActionList> {
        if let Some(Some(project_id)) = &patch.project_id {
            self.ensure_project(project_id).await?;
        }
        if let Some(Some(sprint_id)) = &patch.sprint_id {
            self.ensure_sprint(sprint_id).await?;
        }
        self.lists.update(id, patch).await
    }

    /// Lists one id-ordered window of lists, excluding soft-deleted
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<ActionList>> {
        self.lists.list_visible(limit, offset).await
    }

    /// Returns every soft-deleted list.
    ///
    /// # Errors
    ///
    /// Returns `Database` for storage failures.
    pub async fn list_deleted(&self) -> DomainResult<Vec<ActionList>> {
        self.lists.list_deleted().await
    }

    /// Hard-deletes an action list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the list does not exist.
    pub async fn delete(&self, id: &ActionListId) -> DomainResult<()> {
        self.lists.delete(id).await
    }

    /// Reorders the items to match `order`, a permutation of current
    /// item positions.
    ///
    /// The permutation is validated in full before anything is applied;
    /// an invalid one leaves the list untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing list and `Validation` when
    /// `order` has the wrong length, repeats a position, or points
    /// outside the list.
    pub async fn reorder_items(
        &self,
        id: &ActionListId,
        order: &[usize],
    ) -> DomainResult<ActionList> {
        let list = self.lists.get(id).await?;
        let items = list.items();
        if order.len() != items.len() {
            return Err(DomainError::validation(format!(
                "reorder for list '{id}' names {} position(s) but the list has {} item(s)",
                order.len(),
                items.len()
            )));
        }
        let mut seen = vec![false; items.len()];
        for &position in order {
            let Some(slot) = seen.get_mut(position) else {
                return Err(DomainError::validation(format!(
                    "reorder for list '{id}' points at position {position} outside the list"
                )));
            };
            if *slot {
                return Err(DomainError::validation(format!(
                    "reorder for list '{id}' repeats position {position}"
                )));
            }
            *slot = true;
        }

        // Every position was just validated against the item range.
        let reordered: Vec<ActionItem> = order
            .iter()
            .filter_map(|&position| items.get(position).cloned())
            .collect();
        let patch = ActionListPatch {
            items: Some(reordered),
            ..ActionListPatch::default()
        };
        debug!(list = %id, "items reordered");
        self.lists.update(id, patch).await
    }

    /// Marks the item at `index` as done.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing list or an out-of-range index.
    pub async fn mark_complete(&self, id: &ActionListId, index: usize) -> DomainResult<ActionList> {
        let list = self.lists.get(id).await?;
        let mut items = list.items().to_vec();
        let item = items
            .get_mut(index)
            .ok_or_else(|| item_not_found(id, index))?;
        item.done = true;
        self.replace_items(id, items).await
    }

    /// Appends an open item to the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the list does not exist.
    pub async fn add_item(
        &self,
        id: &ActionListId,
        text: impl Into<String> + Send,
    ) -> DomainResult<ActionList> {
        let list = self.lists.get(id).await?;
        let mut items = list.items().to_vec();
        items.push(ActionItem::open(text));
        self.replace_items(id, items).await
    }

    /// Removes the item at `index`, shifting later items up.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing list or an out-of-range index.
    pub async fn remove_item(&self, id: &ActionListId, index: usize) -> DomainResult<ActionList> {
        let list = self.lists.get(id).await?;
        let mut items = list.items().to_vec();
        if index >= items.len() {
            return Err(item_not_found(id, index));
        }
        items.remove(index);
        self.replace_items(id, items).await
    }

    async fn replace_items(
        &self,
        id: &ActionListId,
        items: Vec<ActionItem>,
    ) -> DomainResult<ActionList> {
        let patch = ActionListPatch {
            items: Some(items),
            ..ActionListPatch::default()
        };
        self.lists.update(id, patch).await
    }

    async fn ensure_project(&self, id: &ProjectId) -> DomainResult<()> {
        if self.projects.exists(id).await? {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "project '{id}' does not exist"
            )))
        }
    }

    async fn ensure_sprint(&self, id: &SprintId) -> DomainResult<()> {
        if self.sprints.exists(id).await? {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "sprint '{id}' does not exist"
            )))
        }
    }
}

fn item_not_found(id: &ActionListId, index: usize) -> DomainError {
    DomainError::new(
        ErrorKind::NotFound,
        format!("list '{id}' has no item at position {index}"),
    )
}
