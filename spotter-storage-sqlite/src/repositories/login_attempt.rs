//! SQLite implementation of the login attempt repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spotter_core::{
    Error, LoginAttempt,
    error::{StorageError, utilities::DatabaseResultExt},
    repositories::LoginAttemptRepository,
};
use sqlx::SqlitePool;

/// SQLite repository for login attempt records.
pub struct SqliteLoginAttemptRepository {
    pool: SqlitePool,
}

impl SqliteLoginAttemptRepository {
    /// Create a new SQLite login attempt repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginAttempt {
    username: String,
    attempt_count: i64,
    first_attempt_at: i64,
    last_attempt_at: i64,
    locked_until: Option<i64>,
}

fn from_millis(millis: i64, column: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        Error::Storage(StorageError::Database(format!(
            "Invalid timestamp in {column}: {millis}"
        )))
    })
}

impl TryFrom<SqliteLoginAttempt> for LoginAttempt {
    type Error = Error;

    fn try_from(row: SqliteLoginAttempt) -> Result<Self, Self::Error> {
        let attempt_count = u32::try_from(row.attempt_count).map_err(|_| {
            Error::Storage(StorageError::Database(format!(
                "Invalid attempt_count for {}: {}",
                row.username, row.attempt_count
            )))
        })?;

        Ok(LoginAttempt {
            attempt_count,
            first_attempt_at: from_millis(row.first_attempt_at, "first_attempt_at")?,
            last_attempt_at: from_millis(row.last_attempt_at, "last_attempt_at")?,
            locked_until: row
                .locked_until
                .map(|ts| from_millis(ts, "locked_until"))
                .transpose()?,
            username: row.username,
        })
    }
}

#[async_trait]
impl LoginAttemptRepository for SqliteLoginAttemptRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<LoginAttempt>, Error> {
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            SELECT username, attempt_count, first_attempt_at, last_attempt_at, locked_until
            FROM login_attempts
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to find login attempt"))
        .map_db_err_with_context("Failed to find login attempt")?;

        row.map(LoginAttempt::try_from).transpose()
    }

    async fn save(&self, attempt: &LoginAttempt) -> Result<LoginAttempt, Error> {
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            INSERT INTO login_attempts
                (username, attempt_count, first_attempt_at, last_attempt_at, locked_until)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                attempt_count = excluded.attempt_count,
                first_attempt_at = excluded.first_attempt_at,
                last_attempt_at = excluded.last_attempt_at,
                locked_until = excluded.locked_until
            RETURNING username, attempt_count, first_attempt_at, last_attempt_at, locked_until
            "#,
        )
        .bind(&attempt.username)
        .bind(i64::from(attempt.attempt_count))
        .bind(attempt.first_attempt_at.timestamp_millis())
        .bind(attempt.last_attempt_at.timestamp_millis())
        .bind(attempt.locked_until.map(|dt| dt.timestamp_millis()))
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, username = %attempt.username, "Failed to save login attempt")
        })
        .map_db_err_with_context("Failed to save login attempt")?;

        row.try_into()
    }

    async fn delete_by_username(&self, username: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM login_attempts WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, username = %username, "Failed to delete login attempt")
            })
            .map_db_err_with_context("Failed to delete login attempt")?;

        Ok(())
    }

    async fn find_all_by_locked_until_after(
        &self,
        after: DateTime<Utc>,
    ) -> Result<Vec<LoginAttempt>, Error> {
        let rows = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            SELECT username, attempt_count, first_attempt_at, last_attempt_at, locked_until
            FROM login_attempts
            WHERE locked_until IS NOT NULL AND locked_until > ?
            "#,
        )
        .bind(after.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to find active lockouts"))
        .map_db_err_with_context("Failed to find active lockouts")?;

        // A corrupt row must not cost every other active lock
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let username = row.username.clone();
                LoginAttempt::try_from(row)
                    .inspect_err(|e| {
                        tracing::warn!(error = %e, username = %username, "Skipping unreadable login attempt")
                    })
                    .ok()
            })
            .collect())
    }
}
