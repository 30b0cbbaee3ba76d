//! End to end lockout behavior against SQLite storage

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use spotter::{
    AuthError, Clock, Error, LoginAttempt, LoginProtectionConfig, ManualClock,
    RepositoryProvider, SpotterBuilder, SqliteRepositoryProvider,
    repositories::{LoginAttemptRepository, LoginAttemptRepositoryProvider},
    services::CredentialVerifier,
};
use sqlx::SqlitePool;

fn setup_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn start_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
    ))
}

async fn migrated_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");
    SqliteRepositoryProvider::new(pool.clone())
        .migrate()
        .await
        .expect("Migration failed");
    pool
}

struct GymMemberVerifier;

#[async_trait]
impl CredentialVerifier for GymMemberVerifier {
    type Principal = String;

    async fn verify(&self, username: &str, password: &str) -> Result<Option<String>, Error> {
        Ok((password == "deadlift").then(|| username.to_string()))
    }
}

#[tokio::test]
async fn test_alice_locked_after_five_failures() {
    setup_tracing();
    let clock = start_clock();
    let spotter = SpotterBuilder::new()
        .with_sqlite_pool(migrated_pool().await)
        .with_login_protection(LoginProtectionConfig::from_millis(5, 300_000))
        .with_clock(clock.clone())
        .build()
        .await
        .unwrap();

    for i in 0..5 {
        spotter.register_failed_login("alice").await;
        clock.advance(Duration::seconds(10 + i));
    }

    assert!(spotter.is_blocked("alice"));
    assert_eq!(spotter.remaining_attempts("alice"), 0);

    // Lock is measured from the first failure at 08:00:00
    let status = spotter.lockout_status("alice");
    assert_eq!(
        status.locked_until,
        Some(Utc.with_ymd_and_hms(2025, 1, 1, 8, 5, 0).unwrap())
    );

    clock.set(Utc.with_ymd_and_hms(2025, 1, 1, 8, 5, 0).unwrap());
    assert!(!spotter.is_blocked("alice"));
    assert_eq!(spotter.remaining_attempts("alice"), 5);
}

#[tokio::test]
async fn test_bob_reset_by_successful_login() {
    setup_tracing();
    let pool = migrated_pool().await;
    let spotter = SpotterBuilder::new()
        .with_sqlite_pool(pool.clone())
        .with_clock(start_clock())
        .build()
        .await
        .unwrap();

    for _ in 0..3 {
        spotter.register_failed_login("bob").await;
    }
    assert_eq!(spotter.remaining_attempts("bob"), 2);

    spotter.register_successful_login("bob").await;
    assert_eq!(spotter.remaining_attempts("bob"), 5);

    let repo = SqliteRepositoryProvider::new(pool);
    let stored = repo
        .login_attempt()
        .find_by_username("bob")
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_carol_lock_survives_restart() {
    setup_tracing();
    let pool = migrated_pool().await;
    let clock = start_clock();

    // Carol is locked until 08:05:00 in the durable store
    {
        let before = SpotterBuilder::new()
            .with_sqlite_pool(pool.clone())
            .with_login_protection(LoginProtectionConfig::from_millis(5, 300_000))
            .with_clock(clock.clone())
            .build()
            .await
            .unwrap();
        for _ in 0..5 {
            before.register_failed_login("carol").await;
        }
        assert!(before.is_blocked("carol"));
    }

    clock.advance(Duration::minutes(2));
    let after = SpotterBuilder::new()
        .with_sqlite_pool(pool)
        .with_login_protection(LoginProtectionConfig::from_millis(5, 300_000))
        .with_clock(clock.clone())
        .build()
        .await
        .unwrap();

    assert!(after.is_blocked("carol"));
    assert_eq!(after.remaining_attempts("carol"), 0);

    clock.advance(Duration::minutes(3));
    assert!(!after.is_blocked("carol"));
}

#[tokio::test]
async fn test_restart_skips_expired_and_unlocked_records() {
    setup_tracing();
    let pool = migrated_pool().await;
    let clock = start_clock();
    let now = clock.now();

    let repo = SqliteRepositoryProvider::new(pool.clone());
    let store = repo.login_attempt();
    // Locked in the past, already expired
    store
        .save(&LoginAttempt::new(
            "dave",
            now - Duration::minutes(10),
            1,
            Duration::minutes(5),
        ))
        .await
        .unwrap();
    // Two failures, never locked
    store
        .save(&LoginAttempt::new("erin", now, 5, Duration::minutes(5)))
        .await
        .unwrap();

    let spotter = SpotterBuilder::new()
        .with_sqlite_pool(pool)
        .with_clock(clock)
        .build()
        .await
        .unwrap();

    assert!(spotter.guard().cache().is_empty());
    assert_eq!(spotter.remaining_attempts("dave"), 5);
    assert_eq!(spotter.remaining_attempts("erin"), 5);
}

#[tokio::test]
async fn test_authentication_service_flow() {
    setup_tracing();
    let spotter = SpotterBuilder::new()
        .with_sqlite_pool(migrated_pool().await)
        .with_login_protection(LoginProtectionConfig::from_millis(3, 300_000))
        .with_clock(start_clock())
        .build()
        .await
        .unwrap();
    let auth = spotter.authentication_service(Arc::new(GymMemberVerifier));

    let err = auth.login("frank", "bench").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Auth(AuthError::InvalidCredentials {
            remaining_attempts: 2
        })
    ));

    auth.login("frank", "bench").await.unwrap_err();
    let err = auth.login("frank", "bench").await.unwrap_err();
    assert!(err.is_account_locked());

    // The facade sees the lock recorded through the service
    assert!(spotter.is_blocked("frank"));
    assert!(auth.login("frank", "deadlift").await.is_err());
}
