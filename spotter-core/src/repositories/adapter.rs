use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error, LoginAttempt,
    repositories::{LoginAttemptRepository, RepositoryProvider},
};

/// Adapter that wraps a RepositoryProvider and implements [`LoginAttemptRepository`]
pub struct LoginAttemptRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LoginAttemptRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LoginAttemptRepository for LoginAttemptRepositoryAdapter<R> {
    async fn find_by_username(&self, username: &str) -> Result<Option<LoginAttempt>, Error> {
        self.provider.login_attempt().find_by_username(username).await
    }

    async fn save(&self, attempt: &LoginAttempt) -> Result<LoginAttempt, Error> {
        self.provider.login_attempt().save(attempt).await
    }

    async fn delete(&self, attempt: &LoginAttempt) -> Result<(), Error> {
        self.provider.login_attempt().delete(attempt).await
    }

    async fn delete_by_username(&self, username: &str) -> Result<(), Error> {
        self.provider.login_attempt().delete_by_username(username).await
    }

    async fn find_all_by_locked_until_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error> {
        self.provider
            .login_attempt()
            .find_all_by_locked_until_after(after)
            .await
    }
}
