//! `PostgreSQL` action list repository.
//!
//! Soft-deleted lists (those whose `parent_deleted_at` is set) stay in
//! the table; only the visibility queries differ.

use super::{
    models::ActionListRow,
    schema::action_lists,
    support::{PgPool, run_blocking, to_u64, translate},
};
use crate::domain::{
    ActionList, ActionListId, ActionListPatch, DomainError, DomainResult, ProjectId, SprintId,
};
use crate::ports::{ActionListRepository, Page, Repository};
use async_trait::async_trait;
use diesel::prelude::*;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL`-backed action list repository.
#[derive(Clone)]
pub struct PgActionListRepository {
    pool: PgPool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PgActionListRepository {
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

fn to_row(list: &ActionList) -> DomainResult<ActionListRow> {
    let data = serde_json::to_value(list).map_err(DomainError::database)?;
    Ok(ActionListRow {
        id: list.id().as_str().to_owned(),
        project_id: list.project_id().map(|id| id.as_str().to_owned()),
        sprint_id: list.sprint_id().map(|id| id.as_str().to_owned()),
        parent_deleted_at: list.parent_deleted_at(),
        data,
        created_at: list.created_at(),
        updated_at: list.updated_at(),
    })
}

fn from_row(row: ActionListRow) -> DomainResult<ActionList> {
    serde_json::from_value(row.data).map_err(DomainError::database)
}

#[async_trait]
impl Repository<ActionList> for PgActionListRepository {
    async fn create(&self, entity: ActionList) -> DomainResult<ActionList> {
        let row = to_row(&entity)?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(action_lists::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate("action list", err))?;
            Ok(())
        })
        .await?;
        Ok(entity)
    }

    async fn get(&self, id: &ActionListId) -> DomainResult<ActionList> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = action_lists::table
                .find(key.clone())
                .select(ActionListRow::as_select())
                .first::<ActionListRow>(connection)
                .optional()
                .map_err(|err| translate("action list", err))?;
            row.map_or_else(|| Err(DomainError::not_found("action list", &key)), from_row)
        })
        .await
    }

    async fn update(&self, id: &ActionListId, patch: ActionListPatch) -> DomainResult<ActionList> {
        let key = id.as_str().to_owned();
        let now = self.clock.utc();
        run_blocking(&self.pool, move |connection| {
            connection.transaction(|txn| {
                let row = action_lists::table
                    .find(key.clone())
                    .select(ActionListRow::as_select())
                    .for_update()
                    .first::<ActionListRow>(txn)
                    .optional()
                    .map_err(|err| translate("action list", err))?
                    .ok_or_else(|| DomainError::not_found("action list", &key))?;
                let mut entity = from_row(row)?;
                entity.apply_patch(patch, now)?;
                let updated = to_row(&entity)?;
                diesel::update(action_lists::table.find(key.clone()))
                    .set((
                        action_lists::project_id.eq(updated.project_id),
                        action_lists::sprint_id.eq(updated.sprint_id),
                        action_lists::parent_deleted_at.eq(updated.parent_deleted_at),
                        action_lists::data.eq(updated.data),
                        action_lists::updated_at.eq(updated.updated_at),
                    ))
                    .execute(txn)
                    .map_err(|err| translate("action list", err))?;
                Ok(entity)
            })
        })
        .await
    }

    async fn delete(&self, id: &ActionListId) -> DomainResult<()> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::delete(action_lists::table.find(key.clone()))
                .execute(connection)
                .map_err(|err| translate("action list", err))?;
            if affected == 0 {
                return Err(DomainError::not_found("action list", &key));
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<ActionList>> {
        run_blocking(&self.pool, move |connection| {
            let total = action_lists::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("action list", err))?;
            let rows = action_lists::table
                .order(action_lists::id.asc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(ActionListRow::as_select())
                .load::<ActionListRow>(connection)
                .map_err(|err| translate("action list", err))?;
            let items = rows
                .into_iter()
                .map(from_row)
                .collect::<DomainResult<Vec<ActionList>>>()?;
            Ok(Page {
                items,
                total: to_u64(total)?,
                limit,
                offset,
            })
        })
        .await
    }

    async fn exists(&self, id: &ActionListId) -> DomainResult<bool> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            diesel::select(diesel::dsl::exists(action_lists::table.find(key)))
                .get_result::<bool>(connection)
                .map_err(|err| translate("action list", err))
        })
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        run_blocking(&self.pool, move |connection| {
            let total = action_lists::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("action list", err))?;
            to_u64(total)
        })
        .await
    }
}

#[async_trait]
impl ActionListRepository for PgActionListRepository {
    async fn list_visible(&self, limit: u32, offset: u32) -> DomainResult<Page<ActionList>> {
        run_blocking(&self.pool, move |connection| {
            let total = action_lists::table
                .filter(action_lists::parent_deleted_at.is_null())
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("action list", err))?;
            let rows = action_lists::table
                .filter(action_lists::parent_deleted_at.is_null())
                .order(action_lists::id.asc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(ActionListRow::as_select())
                .load::<ActionListRow>(connection)
                .map_err(|err| translate("action list", err))?;
            let items = rows
                .into_iter()
                .map(from_row)
                .collect::<DomainResult<Vec<ActionList>>>()?;
            Ok(Page {
                items,
                total: to_u64(total)?,
                limit,
                offset,
            })
        })
        .await
    }

    async fn list_deleted(&self) -> DomainResult<Vec<ActionList>> {
        run_blocking(&self.pool, move |connection| {
            let rows = action_lists::table
                .filter(action_lists::parent_deleted_at.is_not_null())
                .order(action_lists::id.asc())
                .select(ActionListRow::as_select())
                .load::<ActionListRow>(connection)
                .map_err(|err| translate("action list", err))?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<ActionList>> {
        let key = project_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = action_lists::table
                .filter(action_lists::project_id.eq(key))
                .order(action_lists::id.asc())
                .select(ActionListRow::as_select())
                .load::<ActionListRow>(connection)
                .map_err(|err| translate("action list", err))?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }

    async fn list_by_sprint(&self, sprint_id: &SprintId) -> DomainResult<Vec<ActionList>> {
        let key = sprint_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = action_lists::table
                .filter(action_lists::sprint_id.eq(key))
                .order(action_lists::id.asc())
                .select(ActionListRow::as_select())
                .load::<ActionListRow>(connection)
                .map_err(|err| translate("action list", err))?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}
