//! `PostgreSQL` task repository.

use super::{
    models::TaskRow,
    schema::tasks,
    support::{PgPool, run_blocking, to_u64, translate},
};
use crate::domain::{DomainError, DomainResult, Task, TaskId, TaskPatch};
use crate::ports::{Page, Repository, TaskFilter, TaskRepository};
use async_trait::async_trait;
use diesel::prelude::*;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL`-backed task repository.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PgTaskRepository {
    /// Creates a repository using the system clock.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }

    /// Creates a repository with an injected clock.
    #[must_use]
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { pool, clock }
    }
}

fn to_row(task: &Task) -> DomainResult<TaskRow> {
    let data = serde_json::to_value(task).map_err(DomainError::database)?;
    Ok(TaskRow {
        id: task.id().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        owner: task.owner().to_owned(),
        project_id: task.primary_project().as_str().to_owned(),
        sprint_id: task.primary_sprint().as_str().to_owned(),
        data,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn from_row(row: TaskRow) -> DomainResult<Task> {
    serde_json::from_value(row.data).map_err(DomainError::database)
}

#[async_trait]
impl Repository<Task> for PgTaskRepository {
    async fn create(&self, entity: Task) -> DomainResult<Task> {
        let row = to_row(&entity)?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate("task", err))?;
            Ok(())
        })
        .await?;
        Ok(entity)
    }

    async fn get(&self, id: &TaskId) -> DomainResult<Task> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = tasks::table
                .find(key.clone())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(|err| translate("task", err))?;
            row.map_or_else(|| Err(DomainError::not_found("task", &key)), from_row)
        })
        .await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> DomainResult<Task> {
        let key = id.as_str().to_owned();
        let now = self.clock.utc();
        run_blocking(&self.pool, move |connection| {
            connection.transaction(|txn| {
                let row = tasks::table
                    .find(key.clone())
                    .select(TaskRow::as_select())
                    .for_update()
                    .first::<TaskRow>(txn)
                    .optional()
                    .map_err(|err| translate("task", err))?
                    .ok_or_else(|| DomainError::not_found("task", &key))?;
                let mut entity = from_row(row)?;
                entity.apply_patch(patch, now)?;
                let updated = to_row(&entity)?;
                diesel::update(tasks::table.find(key.clone()))
                    .set((
                        tasks::status.eq(updated.status),
                        tasks::priority.eq(updated.priority),
                        tasks::owner.eq(updated.owner),
                        tasks::project_id.eq(updated.project_id),
                        tasks::sprint_id.eq(updated.sprint_id),
                        tasks::data.eq(updated.data),
                        tasks::updated_at.eq(updated.updated_at),
                    ))
                    .execute(txn)
                    .map_err(|err| translate("task", err))?;
                Ok(entity)
            })
        })
        .await
    }

    async fn delete(&self, id: &TaskId) -> DomainResult<()> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::delete(tasks::table.find(key.clone()))
                .execute(connection)
                .map_err(|err| translate("task", err))?;
            if affected == 0 {
                return Err(DomainError::not_found("task", &key));
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Task>> {
        run_blocking(&self.pool, move |connection| {
            let total = tasks::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("task", err))?;
            let rows = tasks::table
                .order(tasks::id.asc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(|err| translate("task", err))?;
            let items = rows
                .into_iter()
                .map(from_row)
                .collect::<DomainResult<Vec<Task>>>()?;
            Ok(Page {
                items,
                total: to_u64(total)?,
                limit,
                offset,
            })
        })
        .await
    }

    async fn exists(&self, id: &TaskId) -> DomainResult<bool> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            diesel::select(diesel::dsl::exists(tasks::table.find(key)))
                .get_result::<bool>(connection)
                .map_err(|err| translate("task", err))
        })
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        run_blocking(&self.pool, move |connection| {
            let total = tasks::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("task", err))?;
            to_u64(total)
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn search(&self, filter: &TaskFilter) -> DomainResult<Vec<Task>> {
        let wanted = filter.clone();
        run_blocking(&self.pool, move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(status) = wanted.status {
                query = query.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(priority) = wanted.priority {
                query = query.filter(tasks::priority.eq(priority.as_str()));
            }
            if let Some(owner) = wanted.owner {
                query = query.filter(tasks::owner.eq(owner));
            }
            if let Some(project_id) = wanted.project_id {
                query = query.filter(tasks::project_id.eq(project_id.as_str().to_owned()));
            }
            if let Some(sprint_id) = wanted.sprint_id {
                query = query.filter(tasks::sprint_id.eq(sprint_id.as_str().to_owned()));
            }
            let rows = query
                .order(tasks::id.asc())
                .load::<TaskRow>(connection)
                .map_err(|err| translate("task", err))?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}
