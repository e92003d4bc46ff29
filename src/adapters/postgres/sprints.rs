//! `PostgreSQL` sprint repository.

use super::{
    models::SprintRow,
    schema::sprints,
    support::{PgPool, run_blocking, to_u64, translate},
};
use crate::domain::{DomainError, DomainResult, ProjectId, Sprint, SprintId, SprintPatch};
use crate::ports::{Page, Repository, SprintRepository};
use async_trait::async_trait;
use diesel::prelude::*;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL`-backed sprint repository.
#[derive(Clone)]
pub struct PgSprintRepository {
    pool: PgPool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PgSprintRepository {
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

fn to_row(sprint: &Sprint) -> DomainResult<SprintRow> {
    let data = serde_json::to_value(sprint).map_err(DomainError::database)?;
    Ok(SprintRow {
        id: sprint.id().as_str().to_owned(),
        project_id: sprint.primary_project().as_str().to_owned(),
        data,
        created_at: sprint.created_at(),
        updated_at: sprint.updated_at(),
    })
}

fn from_row(row: SprintRow) -> DomainResult<Sprint> {
    serde_json::from_value(row.data).map_err(DomainError::database)
}

#[async_trait]
impl Repository<Sprint> for PgSprintRepository {
    async fn create(&self, entity: Sprint) -> DomainResult<Sprint> {
        let row = to_row(&entity)?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(sprints::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate("sprint", err))?;
            Ok(())
        })
        .await?;
        Ok(entity)
    }

    async fn get(&self, id: &SprintId) -> DomainResult<Sprint> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = sprints::table
                .find(key.clone())
                .select(SprintRow::as_select())
                .first::<SprintRow>(connection)
                .optional()
                .map_err(|err| translate("sprint", err))?;
            row.map_or_else(|| Err(DomainError::not_found("sprint", &key)), from_row)
        })
        .await
    }

    async fn update(&self, id: &SprintId, patch: SprintPatch) -> DomainResult<Sprint> {
        let key = id.as_str().to_owned();
        let now = self.clock.utc();
        run_blocking(&self.pool, move |connection| {
            connection.transaction(|txn| {
                let row = sprints::table
                    .find(key.clone())
                    .select(SprintRow::as_select())
                    .for_update()
                    .first::<SprintRow>(txn)
                    .optional()
                    .map_err(|err| translate("sprint", err))?
                    .ok_or_else(|| DomainError::not_found("sprint", &key))?;
                let mut entity = from_row(row)?;
                entity.apply_patch(patch, now)?;
                let updated = to_row(&entity)?;
                diesel::update(sprints::table.find(key.clone()))
                    .set((
                        sprints::project_id.eq(updated.project_id),
                        sprints::data.eq(updated.data),
                        sprints::updated_at.eq(updated.updated_at),
                    ))
                    .execute(txn)
                    .map_err(|err| translate("sprint", err))?;
                Ok(entity)
            })
        })
        .await
    }

    async fn delete(&self, id: &SprintId) -> DomainResult<()> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::delete(sprints::table.find(key.clone()))
                .execute(connection)
                .map_err(|err| translate("sprint", err))?;
            if affected == 0 {
                return Err(DomainError::not_found("sprint", &key));
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Sprint>> {
        run_blocking(&self.pool, move |connection| {
            let total = sprints::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("sprint", err))?;
            let rows = sprints::table
                .order(sprints::id.asc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(SprintRow::as_select())
                .load::<SprintRow>(connection)
                .map_err(|err| translate("sprint", err))?;
            let items = rows
                .into_iter()
                .map(from_row)
                .collect::<DomainResult<Vec<Sprint>>>()?;
            Ok(Page {
                items,
                total: to_u64(total)?,
                limit,
                offset,
            })
        })
        .await
    }

    async fn exists(&self, id: &SprintId) -> DomainResult<bool> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            diesel::select(diesel::dsl::exists(sprints::table.find(key)))
                .get_result::<bool>(connection)
                .map_err(|err| translate("sprint", err))
        })
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        run_blocking(&self.pool, move |connection| {
            let total = sprints::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("sprint", err))?;
            to_u64(total)
        })
        .await
    }
}

#[async_trait]
impl SprintRepository for PgSprintRepository {
    async fn list_by_project(&self, project_id: &ProjectId) -> DomainResult<Vec<Sprint>> {
        let key = project_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = sprints::table
                .filter(sprints::project_id.eq(key))
                .order(sprints::id.asc())
                .select(SprintRow::as_select())
                .load::<SprintRow>(connection)
                .map_err(|err| translate("sprint", err))?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}
