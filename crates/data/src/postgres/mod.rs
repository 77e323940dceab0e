//! Repositories backed by the hosted `PostgreSQL` database.
//!
//! Queries are checked at runtime (`query_as` + `FromRow` row types) and
//! every row is converted into a domain type through `TryFrom`, so a value
//! that fails validation surfaces as `RepositoryError::DataCorruption`
//! instead of a panic.

mod admin_users;
mod contacts;
mod gallery;
mod registrations;

use core::str::FromStr;

use sqlx::PgPool;

use crate::RepositoryError;

/// Postgres implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Parse a TEXT column into a domain type.
fn parse_column<T>(column: &str, value: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    value.parse().map_err(|e: T::Err| {
        RepositoryError::DataCorruption(format!("invalid {column} in database: {e}"))
    })
}

/// Convert a `LIMIT` argument, saturating at `i64::MAX`.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
