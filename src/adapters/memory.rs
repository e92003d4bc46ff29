//! Generic in-memory repository for tests and embedded use.
//!
//! One `InMemoryRepository<E>` instantiation per entity type implements
//! the full generic contract; the entity-specific extension traits are
//! thin impls over the same state. Listings are id-ordered so paginated
//! reads are deterministic.

use crate::domain::{
    ActionList, DomainError, DomainResult, Project, ProjectId, Sprint, SprintId, Task,
};
use crate::ports::{
    ActionListRepository, Entity, Page, Repository, SprintRepository, TaskFilter,
    TaskRepository,
};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory repository over one entity type.
#[derive(Clone)]
pub struct InMemoryRepository<E: Entity> {
    state: Arc<RwLock<HashMap<E::Id, E>>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<E: Entity> InMemoryRepository<E> {
    /// Creates an empty repository using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Creates an empty repository with an injected clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.state
            .read()
            .map_err(|err| DomainError::database(err.to_string()))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.state
            .write()
            .map_err(|err| DomainError::database(err.to_string()))
    }

    fn sorted_values(state: &HashMap<E::Id, E>) -> Vec<E> {
        let mut items: Vec<E> = state.values().cloned().collect();
        items.sort_by(|a, b| a.id().cmp(b.id()));
        items
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn create(&self, entity: E) -> DomainResult<E> {
        let mut state = self.write()?;
        if state.contains_key(entity.id()) {
            return Err(DomainError::conflict(format!(
                "{} '{}' already exists",
                E::KIND,
                entity.id()
            )));
        }
        state.insert(entity.id().clone(), entity.clone());
        Ok(entity)
    }

    async fn get(&self, id: &E::Id) -> DomainResult<E> {
        let state = self.read()?;
        state
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    async fn update(&self, id: &E::Id, patch: E::Patch) -> DomainResult<E> {
        // The write guard is held across load-patch-store, which is this
        // adapter's transaction unit.
        let mut state = self.write()?;
        let mut entity = state
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(E::KIND, id))?;
        entity.apply_patch(patch, self.clock.utc())?;
        state.insert(id.clone(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: &E::Id) -> DomainResult<()> {
        let mut state = self.write()?;
        state
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<E>> {
        let state = self.read()?;
        let all = Self::sorted_values(&state);
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    async fn exists(&self, id: &E::Id) -> DomainResult<bool> {
        Ok(self.read()?.contains_key(id))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.read()?.len() as u64)
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository<Task> {
    async fn search(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        let state = self.read()?;
        let mut matches: Vec<Task> = state
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(matches)
    }
}

#[async_trait]
impl SprintRepository for InMemoryRepository<Sprint> {
    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<Sprint>> {
        let state = self.read()?;
        let mut sprints: Vec<Sprint> = state
            .values()
            .filter(|sprint| sprint.primary_project() == project_id)
            .cloned()
            .collect();
        sprints.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(sprints)
    }
}

#[async_trait]
impl ActionListRepository for InMemoryRepository<ActionList> {
    async fn list_visible(&self, limit: u32, offset: u32) -> DomainResult<Page<ActionList>> {
        let state = self.read()?;
        let mut visible: Vec<ActionList> = state
            .values()
            .filter(|list| !list.is_soft_deleted())
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.id().cmp(b.id()));
        let total = visible.len() as u64;
        let items = visible
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }

    async fn list_deleted(&self) -> DomainResult<Vec<ActionList>> {
        let state = self.read()?;
        let mut deleted: Vec<ActionList> = state
            .values()
            .filter(|list| list.is_soft_deleted())
            .cloned()
            .collect();
        deleted.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(deleted)
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<ActionList>> {
        let state = self.read()?;
        let mut linked: Vec<ActionList> = state
            .values()
            .filter(|list| list.project_id() == Some(project_id))
            .cloned()
            .collect();
        linked.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(linked)
    }

    async fn list_by_sprint(&self, sprint_id: &SprintId) -> DomainResult<Vec<ActionList>> {
        let state = self.read()?;
        let mut linked: Vec<ActionList> = state
            .values()
            .filter(|list| list.sprint_id() == Some(sprint_id))
            .cloned()
            .collect();
        linked.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(linked)
    }
}

/// In-memory task repository.
pub type InMemoryTaskRepository = InMemoryRepository<Task>;
/// In-memory project repository.
pub type InMemoryProjectRepository = InMemoryRepository<Project>;
/// In-memory sprint repository.
pub type InMemorySprintRepository = InMemoryRepository<Sprint>;
/// In-memory action list repository.
pub type InMemoryActionListRepository = InMemoryRepository<ActionList>;
