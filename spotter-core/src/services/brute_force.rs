//! Brute force protection for username/password logins.
//!
//! The guard counts consecutive failed logins per username and locks the
//! account once the configured threshold is reached. The lock lasts a fixed
//! window measured from the first failure, and further failures during the
//! lock do not extend it.
//!
//! # Cache and durable store
//!
//! Every read is served from the in-memory [`AttemptCache`]. Writes update the
//! cache first and are then written through to a [`LoginAttemptRepository`].
//! The repository is only read by [`BruteForceGuard::init_cache`], which runs
//! once at startup and restores locks that are still active.
//!
//! Writes for one username are serialized end to end, store call included, so
//! the durable copy always ends up matching the latest cache state for that
//! username.
//!
//! Durable store failures never fail a login: they are logged and the cache
//! keeps serving. If restoring at startup fails, the guard starts with an empty
//! cache and previously locked accounts are unprotected until they fail again.
//!
//! # Example
//!
//! ```rust,ignore
//! use spotter_core::{LoginProtectionConfig, services::BruteForceGuard};
//!
//! let guard = BruteForceGuard::new(repository, LoginProtectionConfig::default());
//! guard.init_cache().await;
//!
//! if guard.is_blocked("alice") {
//!     // Reject without checking the password
//! }
//!
//! // After a bad password
//! let status = guard.register_failed_login("alice").await;
//! ```

use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::{
    AttemptCache, Error, LockoutStatus, LoginAttempt, LoginProtectionConfig,
    clock::{Clock, SystemClock},
    error::StorageError,
    repositories::LoginAttemptRepository,
};

/// Service tracking failed logins and account lockout.
///
/// # Thread Safety
///
/// The guard is meant to be built once and shared behind an `Arc`. Failed
/// and successful login updates for the same username, including their store
/// writes, run one at a time; updates for different usernames run in parallel.
/// Reads never wait on them.
pub struct BruteForceGuard<R: LoginAttemptRepository> {
    repository: Arc<R>,
    cache: AttemptCache,
    config: LoginProtectionConfig,
    clock: Arc<dyn Clock>,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held while a username's cache update and store write are in flight.
///
/// Dropping it releases the username and forgets its mutex once nobody else
/// is waiting on it.
struct WriteLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    username: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(self.username, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl<R: LoginAttemptRepository> BruteForceGuard<R> {
    /// Create a guard using the system clock.
    pub fn new(repository: Arc<R>, config: LoginProtectionConfig) -> Self {
        Self::with_clock(repository, config, Arc::new(SystemClock))
    }

    /// Create a guard that reads time from `clock`.
    pub fn with_clock(
        repository: Arc<R>,
        config: LoginProtectionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache: AttemptCache::new(),
            config,
            clock,
            write_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LoginProtectionConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn cache(&self) -> &AttemptCache {
        &self.cache
    }

    /// Restore active locks from the durable store.
    ///
    /// Must run before the guard serves any login. Only records whose lock is
    /// still in the future are loaded; everything else is left behind, so
    /// partial attempt counts do not survive a restart.
    ///
    /// # Returns
    ///
    /// The number of restored records. A store failure is logged and yields 0
    /// with an empty cache.
    pub async fn init_cache(&self) -> usize {
        if !self.config.enabled {
            return 0;
        }

        let now = self.clock.now();
        let result = self
            .with_store_timeout(
                "find active lockouts",
                self.repository.find_all_by_locked_until_after(now),
            )
            .await;

        match result {
            Ok(attempts) => {
                let restored = attempts
                    .into_iter()
                    .filter(|attempt| attempt.is_locked_at(now))
                    .collect::<Vec<_>>();
                let count = restored.len();
                self.cache.replace_all(restored);
                info!(count, "Restored active account lockouts");
                count
            }
            Err(e) => {
                self.cache.replace_all(std::iter::empty());
                error!(
                    error = %e,
                    "Failed to restore account lockouts, starting with no active locks"
                );
                0
            }
        }
    }

    /// Whether logins for `username` must be rejected right now.
    pub fn is_blocked(&self, username: &str) -> bool {
        if !self.config.enabled {
            return false;
        }

        let blocked = self
            .cache
            .get(username)
            .is_some_and(|attempt| attempt.is_locked_at(self.clock.now()));
        if blocked {
            debug!(username = %username, "Login blocked by active lockout");
        }
        blocked
    }

    /// Failures still allowed before `username` locks.
    pub fn remaining_attempts(&self, username: &str) -> u32 {
        self.lockout_status(username).remaining_attempts
    }

    /// Current lockout state for `username`.
    pub fn lockout_status(&self, username: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(username, self.config.max_login_attempts);
        }

        match self.cache.get(username) {
            Some(attempt) => LockoutStatus::from_attempt(
                &attempt,
                self.clock.now(),
                self.config.max_login_attempts,
            ),
            None => LockoutStatus::unlocked(username, self.config.max_login_attempts),
        }
    }

    /// Record a failed login for `username`.
    ///
    /// Starts a new window when there is no live record, otherwise counts the
    /// failure and locks the account once the threshold is reached. The updated
    /// record is then saved to the durable store; a failed save is logged and
    /// otherwise ignored.
    ///
    /// # Returns
    ///
    /// The lockout state after this failure.
    pub async fn register_failed_login(&self, username: &str) -> LockoutStatus {
        if !self.config.enabled {
            return LockoutStatus::unlocked(username, self.config.max_login_attempts);
        }

        let _write = self.lock_username(username).await;
        let now = self.clock.now();
        let max_login_attempts = self.config.max_login_attempts;
        let lockout_duration = self.config.lockout_duration;

        let mut was_locked = false;
        let attempt = self.cache.update(
            username,
            || LoginAttempt::new(username, now, max_login_attempts, lockout_duration),
            |attempt| {
                was_locked = attempt.is_locked_at(now);
                attempt.record_failure(now, max_login_attempts, lockout_duration);
            },
        );

        if !was_locked && attempt.is_locked_at(now) {
            info!(
                username = %username,
                attempt_count = attempt.attempt_count,
                locked_until = ?attempt.locked_until,
                "Account locked after too many failed logins"
            );
        } else {
            debug!(
                username = %username,
                attempt_count = attempt.attempt_count,
                "Recorded failed login"
            );
        }

        if let Err(e) = self
            .with_store_timeout("save login attempt", self.repository.save(&attempt))
            .await
        {
            warn!(
                username = %username,
                error = %e,
                "Failed to persist login attempt, keeping in-memory state only"
            );
        }

        LockoutStatus::from_attempt(&attempt, now, max_login_attempts)
    }

    /// Clear all failed login state for `username` after a successful login.
    pub async fn register_successful_login(&self, username: &str) {
        if !self.config.enabled {
            return;
        }

        let _write = self.lock_username(username).await;
        let deleted = match self.cache.remove(username) {
            Some(attempt) => {
                debug!(username = %username, "Cleared failed login state");
                self.with_store_timeout("delete login attempt", self.repository.delete(&attempt))
                    .await
            }
            // The store may still hold a row the cache never restored
            None => {
                self.with_store_timeout(
                    "delete login attempt",
                    self.repository.delete_by_username(username),
                )
                .await
            }
        };

        if let Err(e) = deleted {
            warn!(
                username = %username,
                error = %e,
                "Failed to delete persisted login attempt"
            );
        }
    }

    async fn lock_username<'a>(&'a self, username: &'a str) -> WriteLock<'a> {
        let lock = self
            .write_locks
            .entry(username.to_string())
            .or_default()
            .value()
            .clone();
        WriteLock {
            locks: &self.write_locks,
            username,
            guard: Some(lock.lock_owned().await),
        }
    }

    async fn with_store_timeout<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.config.store_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Storage(StorageError::Timeout(operation.to_string()))),
        }
    }
}
