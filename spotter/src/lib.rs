//! # Spotter
//!
//! Spotter protects username/password logins against brute force attacks. It
//! counts consecutive failed logins per username and locks the account for a
//! fixed window once a threshold is reached.
//!
//! Lockout state is served from memory and written through to a durable store,
//! so active locks survive a restart.
//!
//! ## Storage Support
//!
//! Spotter currently supports the following storage backends:
//! - SQLite
//!
//! Any other backend can be plugged in by implementing
//! [`RepositoryProvider`] and passing it to
//! [`SpotterBuilder::with_repositories`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use spotter::{LoginProtectionConfig, SpotterBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let spotter = SpotterBuilder::new()
//!         .with_sqlite("sqlite://spotter.db?mode=rwc")
//!         .await?
//!         .with_login_protection(LoginProtectionConfig::from_millis(5, 300_000))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     if spotter.is_blocked("alice") {
//!         // Reject the login without checking the password
//!     }
//!
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use spotter_core::{
    repositories::LoginAttemptRepositoryAdapter,
    services::{AuthenticationService, BruteForceGuard, CredentialVerifier},
};

mod builder;

pub use builder::{NoStorage, SpotterBuilder, SpotterBuilderError, WithStorage};

/// Re-export core types from spotter_core
pub use spotter_core::{repositories, services};
pub use spotter_core::{
    Clock, Error, LockoutStatus, LoginAttempt, LoginProtectionConfig, ManualClock,
    RepositoryProvider, SystemClock,
    error::{AuthError, StorageError, ValidationError},
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "sqlite")]
pub use spotter_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use spotter_storage_sqlite::*;
}

/// The guard type used by [`Spotter`] for a given repository provider.
pub type Guard<R> = BruteForceGuard<LoginAttemptRepositoryAdapter<R>>;

/// Login protection bound to a storage backend.
///
/// Build one with [`SpotterBuilder`] at startup and share it with request
/// handlers. The builder restores active locks from storage before handing
/// the instance out.
pub struct Spotter<R: RepositoryProvider> {
    repositories: Arc<R>,
    guard: Arc<Guard<R>>,
}

impl<R: RepositoryProvider> Spotter<R> {
    /// Wrap an already constructed guard.
    ///
    /// Prefer [`SpotterBuilder`], which also restores active locks.
    pub fn new(repositories: Arc<R>, guard: Arc<Guard<R>>) -> Self {
        Self {
            repositories,
            guard,
        }
    }

    pub fn guard(&self) -> &Arc<Guard<R>> {
        &self.guard
    }

    pub fn config(&self) -> &LoginProtectionConfig {
        self.guard.config()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Create a login service that checks credentials with `verifier`.
    ///
    /// The service shares this instance's guard, so lockouts recorded through
    /// it are visible to [`Spotter::is_blocked`] and vice versa.
    pub fn authentication_service<V: CredentialVerifier>(
        &self,
        verifier: Arc<V>,
    ) -> AuthenticationService<V, LoginAttemptRepositoryAdapter<R>> {
        AuthenticationService::new(verifier, self.guard.clone())
    }

    /// Whether `username` is currently locked out
    pub fn is_blocked(&self, username: &str) -> bool {
        self.guard.is_blocked(username)
    }

    /// Failed logins `username` has left before being locked
    pub fn remaining_attempts(&self, username: &str) -> u32 {
        self.guard.remaining_attempts(username)
    }

    pub fn lockout_status(&self, username: &str) -> LockoutStatus {
        self.guard.lockout_status(username)
    }

    /// Record a failed login for `username`.
    ///
    /// # Returns
    ///
    /// The lockout status after recording the failure
    pub async fn register_failed_login(&self, username: &str) -> LockoutStatus {
        self.guard.register_failed_login(username).await
    }

    /// Record a successful login for `username`, clearing its failures
    pub async fn register_successful_login(&self, username: &str) {
        self.guard.register_successful_login(username).await
    }
}
