//! `PostgreSQL` project repository.

use super::{
    models::ProjectRow,
    schema::projects,
    support::{PgPool, run_blocking, to_u64, translate},
};
use crate::domain::{DomainError, DomainResult, Project, ProjectId, ProjectPatch};
use crate::ports::{Page, Repository};
use async_trait::async_trait;
use diesel::prelude::*;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL`-backed project repository.
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PgProjectRepository {
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

fn to_row(project: &Project) -> DomainResult<ProjectRow> {
    let data = serde_json::to_value(project).map_err(DomainError::database)?;
    Ok(ProjectRow {
        id: project.id().as_str().to_owned(),
        status: project.status().as_str().to_owned(),
        data,
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    })
}

fn from_row(row: ProjectRow) -> DomainResult<Project> {
    serde_json::from_value(row.data).map_err(DomainError::database)
}

#[async_trait]
impl Repository<Project> for PgProjectRepository {
    async fn create(&self, entity: Project) -> DomainResult<Project> {
        let row = to_row(&entity)?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| translate("project", err))?;
            Ok(())
        })
        .await?;
        Ok(entity)
    }

    async fn get(&self, id: &ProjectId) -> DomainResult<Project> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = projects::table
                .find(key.clone())
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(|err| translate("project", err))?;
            row.map_or_else(|| Err(DomainError::not_found("project", &key)), from_row)
        })
        .await
    }

    async fn update(&self, id: &ProjectId, patch: ProjectPatch) -> DomainResult<Project> {
        let key = id.as_str().to_owned();
        let now = self.clock.utc();
        run_blocking(&self.pool, move |connection| {
            connection.transaction(|txn| {
                let row = projects::table
                    .find(key.clone())
                    .select(ProjectRow::as_select())
                    .for_update()
                    .first::<ProjectRow>(txn)
                    .optional()
                    .map_err(|err| translate("project", err))?
                    .ok_or_else(|| DomainError::not_found("project", &key))?;
                let mut entity = from_row(row)?;
                entity.apply_patch(patch, now)?;
                let updated = to_row(&entity)?;
                diesel::update(projects::table.find(key.clone()))
                    .set((
                        projects::status.eq(updated.status),
                        projects::data.eq(updated.data),
                        projects::updated_at.eq(updated.updated_at),
                    ))
                    .execute(txn)
                    .map_err(|err| translate("project", err))?;
                Ok(entity)
            })
        })
        .await
    }

    async fn delete(&self, id: &ProjectId) -> DomainResult<()> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let affected = diesel::delete(projects::table.find(key.clone()))
                .execute(connection)
                .map_err(|err| translate("project", err))?;
            if affected == 0 {
                return Err(DomainError::not_found("project", &key));
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, limit: u32, offset: u32) -> DomainResult<Page<Project>> {
        run_blocking(&self.pool, move |connection| {
            let total = projects::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("project", err))?;
            let rows = projects::table
                .order(projects::id.asc())
                .limit(i64::from(limit))
                .offset(i64::from(offset))
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)
                .map_err(|err| translate("project", err))?;
            let items = rows
                .into_iter()
                .map(from_row)
                .collect::<DomainResult<Vec<Project>>>()?;
            Ok(Page {
                items,
                total: to_u64(total)?,
                limit,
                offset,
            })
        })
        .await
    }

    async fn exists(&self, id: &ProjectId) -> DomainResult<bool> {
        let key = id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            diesel::select(diesel::dsl::exists(projects::table.find(key)))
                .get_result::<bool>(connection)
                .map_err(|err| translate("project", err))
        })
        .await
    }

    async fn count(&self) -> DomainResult<u64> {
        run_blocking(&self.pool, move |connection| {
            let total = projects::table
                .count()
                .get_result::<i64>(connection)
                .map_err(|err| translate("project", err))?;
            to_u64(total)
        })
        .await
    }
}
