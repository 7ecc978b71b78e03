#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` persistence for PR Reviewer.
//!
//! [`SqliteStore`] owns a WAL-mode connection pool and hands out one
//! [`SqliteUnitOfWork`] per operation. Repository calls outside a
//! transaction run in autocommit mode on a lazily acquired connection.

mod pool;
mod queries;
mod rows;
mod schema;
mod unit_of_work;

use std::path::Path;

use async_trait::async_trait;
use reviewer_repository::{RepositoryError, UnitOfWork, UnitOfWorkFactory};
use sqlx::SqlitePool;

pub use pool::create_pool;
pub use schema::run_migrations;
pub use unit_of_work::SqliteUnitOfWork;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and bring its
    /// schema up to date.
    ///
    /// # Errors
    ///
    /// * If the parent directory cannot be created
    /// * If the pool cannot be opened
    /// * If a migration fails
    pub async fn open(db_path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pool = create_pool(db_path).await?;
        run_migrations(&pool).await?;

        log::info!("SQLite store ready at {}", db_path.display());

        Ok(Self { pool })
    }

    /// Wrap an existing pool. The schema is assumed to be in place.
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn unit_of_work(&self) -> SqliteUnitOfWork {
        SqliteUnitOfWork::new(self.pool.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UnitOfWorkFactory for SqliteStore {
    async fn create(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        Ok(Box::new(self.unit_of_work()))
    }
}
