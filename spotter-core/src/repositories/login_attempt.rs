//! Repository trait for durable login attempt storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, LoginAttempt};

/// Durable storage for [`LoginAttempt`] records, keyed by username.
///
/// The guard writes every change through to this repository but never reads
/// from it while serving logins. It is read once at startup to restore locks
/// that were active when the process stopped.
///
/// Only the brute force guard should write to this repository.
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync + 'static {
    /// Find the record for a username.
    async fn find_by_username(&self, username: &str) -> Result<Option<LoginAttempt>, Error>;

    /// Insert or replace the record for `attempt.username`.
    ///
    /// # Returns
    ///
    /// The record as stored.
    async fn save(&self, attempt: &LoginAttempt) -> Result<LoginAttempt, Error>;

    /// Delete the record for `attempt.username`. Deleting a missing record is not an error.
    async fn delete(&self, attempt: &LoginAttempt) -> Result<(), Error> {
        self.delete_by_username(&attempt.username).await
    }

    /// Delete whatever record is stored for `username`, without reading it first.
    async fn delete_by_username(&self, username: &str) -> Result<(), Error>;

    /// All records whose `locked_until` is strictly after `after`.
    ///
    /// Records without a lock are never returned.
    async fn find_all_by_locked_until_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error>;
}
