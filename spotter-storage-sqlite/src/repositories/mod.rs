//! Repository implementations for SQLite storage

pub mod login_attempt;

pub use login_attempt::SqliteLoginAttemptRepository;

use async_trait::async_trait;
use spotter_core::{
    Error,
    error::StorageError,
    repositories::{LoginAttemptRepositoryProvider, RepositoryProvider},
};
use sqlx::SqlitePool;

use crate::migrations::SqliteMigrator;

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    login_attempt: SqliteLoginAttemptRepository,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let login_attempt = SqliteLoginAttemptRepository::new(pool.clone());
        Self {
            pool,
            login_attempt,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LoginAttemptRepositoryProvider for SqliteRepositoryProvider {
    type LoginAttemptRepo = SqliteLoginAttemptRepository;

    fn login_attempt(&self) -> &Self::LoginAttemptRepo {
        &self.login_attempt
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let applied = SqliteMigrator::new(self.pool.clone())
            .run()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                Error::Storage(StorageError::Migration(e.to_string()))
            })?;
        tracing::debug!(applied, "Schema up to date");

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(())
    }
}
