//! Builder pattern for constructing Spotter instances
//!
//! This module provides a type-safe builder for creating [`Spotter`] instances with
//! compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use spotter::SpotterBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build with SQLite and auto-migration
//!     let spotter = SpotterBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use spotter_core::{
    Clock, LoginProtectionConfig, RepositoryProvider, SystemClock,
    repositories::LoginAttemptRepositoryAdapter, services::BruteForceGuard,
};

use crate::Spotter;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Spotter instance.
#[derive(Debug, thiserror::Error)]
pub enum SpotterBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`SpotterBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Spotter`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct SpotterBuilder<Storage> {
    storage: Storage,
    login_protection: LoginProtectionConfig,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
}

impl Default for SpotterBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotterBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Login protection: Enabled (5 attempts, 5 min lockout)
    /// - Clock: system time
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            login_protection: LoginProtectionConfig::default(),
            clock: Arc::new(SystemClock),
            apply_migrations: false,
        }
    }

    /// Use any storage backend that implements [`RepositoryProvider`].
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> SpotterBuilder<WithStorage<R>> {
        SpotterBuilder {
            storage: WithStorage { repositories },
            login_protection: self.login_protection,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
        }
    }
}

// ============================================================================
// Storage Configuration Methods (NoStorage -> WithStorage)
// ============================================================================

#[cfg(feature = "sqlite")]
impl SpotterBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/db.sqlite")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<
        SpotterBuilder<WithStorage<crate::sqlite::SqliteRepositoryProvider>>,
        SpotterBuilderError,
    > {
        let storage = crate::sqlite::SqliteStorage::connect(url)
            .await
            .map_err(|e| SpotterBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    ///
    /// Use this when you already have a SQLite connection pool and want to
    /// share it with Spotter.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> SpotterBuilder<WithStorage<crate::sqlite::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::sqlite::SqliteRepositoryProvider::new(
            pool,
        )))
    }
}

// ============================================================================
// Configuration Methods (available after storage is configured)
// ============================================================================

impl<R: RepositoryProvider> SpotterBuilder<WithStorage<R>> {
    /// Configure login protection settings.
    ///
    /// Default: Enabled with 5 attempts and a 5 minute lockout
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use spotter::{LoginProtectionConfig, SpotterBuilder};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let spotter = SpotterBuilder::new()
    ///     .with_sqlite("sqlite::memory:")
    ///     .await?
    ///     .with_login_protection(LoginProtectionConfig::from_millis(3, 60_000))
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_login_protection(mut self, config: LoginProtectionConfig) -> Self {
        self.login_protection = config;
        self
    }

    /// Set the time source used for lockout windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set whether to automatically apply database migrations during build.
    ///
    /// Default: false
    ///
    /// When `false`, the schema must already exist when `build()` is called,
    /// otherwise restoring active locks fails and the instance starts with an
    /// empty cache.
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Build the Spotter instance.
    ///
    /// Validates the configuration, applies migrations if requested and
    /// restores still active locks from storage before returning.
    pub async fn build(self) -> Result<Spotter<R>, SpotterBuilderError> {
        self.login_protection
            .validate()
            .map_err(|e| SpotterBuilderError::InvalidConfiguration(e.to_string()))?;

        // Run migrations if requested
        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| SpotterBuilderError::Migration(e.to_string()))?;
        }

        let repositories = self.storage.repositories;
        let guard = Arc::new(BruteForceGuard::with_clock(
            Arc::new(LoginAttemptRepositoryAdapter::new(repositories.clone())),
            self.login_protection,
            self.clock,
        ));

        let restored = guard.init_cache().await;
        tracing::debug!(restored, "Spotter ready");

        Ok(Spotter::new(repositories, guard))
    }
}
