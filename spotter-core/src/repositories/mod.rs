//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to interact with storage.
//!
//! # Trait Hierarchy
//!
//! - [`LoginAttemptRepository`] defines the durable operations for failed login state
//! - [`LoginAttemptRepositoryProvider`] gives access to a backend's repository
//! - [`RepositoryProvider`] adds lifecycle methods (migrations, health checks)
//!
//! Services depend on [`LoginAttemptRepository`] only. A storage backend implements
//! [`RepositoryProvider`] and is handed to services through
//! [`LoginAttemptRepositoryAdapter`].

pub mod adapter;
pub mod login_attempt;

pub use adapter::LoginAttemptRepositoryAdapter;
pub use login_attempt::LoginAttemptRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for login attempt repository access.
pub trait LoginAttemptRepositoryProvider: Send + Sync + 'static {
    /// The login attempt repository implementation type
    type LoginAttemptRepo: LoginAttemptRepository;

    /// Get the login attempt repository
    fn login_attempt(&self) -> &Self::LoginAttemptRepo;
}

/// Provider trait that storage implementations must implement.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement [`LoginAttemptRepository`] for your backend
/// 2. Implement [`LoginAttemptRepositoryProvider`]
/// 3. Implement [`RepositoryProvider`] with `migrate()` and `health_check()`
///
/// # Example
///
/// ```rust,ignore
/// use spotter_core::repositories::*;
///
/// struct MyStorage { login_attempts: MyLoginAttemptRepository }
///
/// impl LoginAttemptRepositoryProvider for MyStorage {
///     type LoginAttemptRepo = MyLoginAttemptRepository;
///     fn login_attempt(&self) -> &Self::LoginAttemptRepo { &self.login_attempts }
/// }
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: LoginAttemptRepositoryProvider {
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
