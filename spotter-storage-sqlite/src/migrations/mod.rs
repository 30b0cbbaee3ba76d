//! SQLite schema migrations for login protection.
//!
//! Migrations are plain SQL statements applied in version order. Each runs in
//! its own transaction together with the row recording it in
//! [`MIGRATION_TABLE`], so a migration is either fully applied and recorded or
//! not at all. There is no rollback; the schema only moves forward.

use chrono::Utc;
use sqlx::SqlitePool;

/// Table recording which migration versions have been applied
pub const MIGRATION_TABLE: &str = "_spotter_migrations";

/// A single forward-only schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration this backend knows, in the order they must run.
pub const MIGRATIONS: &[Migration] = &[
    // Failed login state, one row per username. Timestamps are unix milliseconds.
    Migration {
        version: 1,
        name: "create_login_attempts",
        sql: r#"
            CREATE TABLE IF NOT EXISTS login_attempts (
                username TEXT PRIMARY KEY,
                attempt_count INTEGER NOT NULL CHECK (attempt_count >= 1),
                first_attempt_at INTEGER NOT NULL,
                last_attempt_at INTEGER NOT NULL,
                locked_until INTEGER
            )"#,
    },
    // Backs the startup query for active lockouts
    Migration {
        version: 2,
        name: "index_login_attempts_locked_until",
        sql: "CREATE INDEX IF NOT EXISTS idx_login_attempts_locked_until ON login_attempts(locked_until)",
    },
];

/// Applies [`MIGRATIONS`] to a SQLite database.
pub struct SqliteMigrator {
    pool: SqlitePool,
}

impl SqliteMigrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration not yet recorded.
    ///
    /// # Returns
    ///
    /// The number of migrations applied by this call.
    pub async fn run(&self) -> Result<usize, sqlx::Error> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await?;

        let applied = self.applied_versions().await?;
        let mut count = 0;
        for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
            let mut tx = self.pool.begin().await?;
            sqlx::query(migration.sql).execute(&mut *tx).await?;
            sqlx::query(&format!(
                "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
            ))
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applied migration"
            );
            count += 1;
        }

        Ok(count)
    }

    /// Versions already applied, ascending.
    pub async fn applied_versions(&self) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT version FROM {MIGRATION_TABLE} ORDER BY version"
        ))
        .fetch_all(&self.pool)
        .await
    }
}
