//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. All timestamps are stored as fixed-width
//! RFC 3339 strings with microsecond precision, so `ORDER BY created_at`
//! is chronological.

pub mod agent;
pub mod conversation;
pub mod log;
pub mod pool;
pub mod role;
pub mod user;

use agentdesk_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Map a write error, turning UNIQUE violations into `Conflict(what)`.
pub(crate) fn write_error(e: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.message().contains("UNIQUE") {
            return RepositoryError::Conflict(what());
        }
    }
    query_error(e)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> pool::DatabasePool {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    // Leak the tempdir so it outlives the test's pools.
    std::mem::forget(dir);
    pool::DatabasePool::open(&path).await.unwrap()
}
