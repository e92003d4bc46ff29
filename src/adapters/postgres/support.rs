//! Shared plumbing for the `PostgreSQL` repositories: pool construction,
//! blocking off-load, and storage error translation.

use crate::domain::{DomainError, DomainResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool shared by the repositories.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds an r2d2 connection pool for the given database URL.
///
/// # Errors
///
/// Returns a `Database` error when the pool cannot be constructed.
pub fn build_pool(database_url: &str, max_size: u32) -> DomainResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(DomainError::database)
}

/// Runs a blocking Diesel closure on the tokio blocking pool.
pub(super) async fn run_blocking<F, T>(pool: &PgPool, f: F) -> DomainResult<T>
where
    F: FnOnce(&mut PgConnection) -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = handle.get().map_err(DomainError::database)?;
        f(&mut connection)
    })
    .await
    .map_err(DomainError::database)?
}

/// Translates a Diesel error into the nearest taxonomy member.
///
/// Duplicate keys become `Conflict`, missing foreign keys become
/// `Validation`, serialization failures become `Concurrency`, and
/// everything else becomes `Database`. No raw storage error leaks past
/// this function.
pub(super) fn translate(entity: &'static str, err: DieselError) -> DomainError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DomainError::conflict(format!(
                "{entity} violates a uniqueness constraint: {}",
                info.message()
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DomainError::validation(format!(
                "{entity} references a missing parent: {}",
                info.message()
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
            DomainError::concurrency(info.message().to_owned())
        }
        other => DomainError::database(other),
    }
}

impl From<DieselError> for DomainError {
    fn from(err: DieselError) -> Self {
        translate("record", err)
    }
}

/// Converts a storage count to the port's unsigned representation.
pub(super) fn to_u64(value: i64) -> DomainResult<u64> {
    u64::try_from(value).map_err(DomainError::database)
}
