//! Summer Camp Data - repositories over Postgres or the demo dataset.
//!
//! # Data modes
//!
//! - **Live**: a `DATABASE_URL` is configured; every repository runs sqlx
//!   queries against the hosted Postgres database.
//! - **Demo**: no database is configured; every repository reads and writes
//!   an in-memory copy of [`mock::data`], so the site and admin work out of
//!   the box.
//!
//! Handlers only ever see the [`Datastore`] bundle of trait objects and do
//! not care which mode is active.
//!
//! # Tables
//!
//! - `registrations` - camp registrations and payment state
//! - `gallery_collections` / `gallery_photos` - the photo gallery
//! - `admin_users` - admin role lookup table
//! - `contact_submissions` - contact form requests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/data/migrations/` and run via:
//! ```bash
//! cargo run -p summer-camp-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod mock;
pub mod postgres;
pub mod repository;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use summer_camp_core::RegistrationError;

pub use mock::MockStore;
pub use postgres::PgStore;
pub use repository::{
    AdminUserRepository, ContactRepository, GalleryRepository, RecordedPayment,
    RegistrationRepository,
};

/// Migrations for every table, embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The requested change breaks a domain rule.
    #[error("rejected: {0}")]
    Rejected(#[from] RegistrationError),

    /// The backing store cannot be reached.
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into [`Self::Conflict`].
    pub(crate) fn from_insert(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(e)
    }
}

/// Which backend the [`Datastore`] is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Live,
    Demo,
}

impl DataMode {
    #[must_use]
    pub const fn is_demo(self) -> bool {
        matches!(self, Self::Demo)
    }
}

/// One implementation of every repository, plus the mode they run in.
#[derive(Clone)]
pub struct Datastore {
    pub registrations: Arc<dyn RegistrationRepository>,
    pub gallery: Arc<dyn GalleryRepository>,
    pub admin_users: Arc<dyn AdminUserRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    mode: DataMode,
    pool: Option<PgPool>,
}

impl Datastore {
    /// Repositories backed by Postgres.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            registrations: store.clone(),
            gallery: store.clone(),
            admin_users: store.clone(),
            contacts: store,
            mode: DataMode::Live,
            pool: Some(pool),
        }
    }

    /// Repositories backed by a fresh copy of the demo dataset.
    #[must_use]
    pub fn demo() -> Self {
        let store = Arc::new(MockStore::seeded());
        Self {
            registrations: store.clone(),
            gallery: store.clone(),
            admin_users: store.clone(),
            contacts: store,
            mode: DataMode::Demo,
            pool: None,
        }
    }

    /// Connect when a database URL is configured, otherwise fall back to demo
    /// data.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if a URL is configured but the pool cannot be
    /// created.
    pub async fn connect(database_url: Option<&SecretString>) -> Result<Self, sqlx::Error> {
        match database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                tracing::info!("Database pool created");
                Ok(Self::postgres(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, serving demo data");
                Ok(Self::demo())
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> DataMode {
        self.mode
    }

    /// The Postgres pool in live mode.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Check that the backing store answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
