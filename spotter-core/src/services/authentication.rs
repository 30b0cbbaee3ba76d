//! Login flow wrapped around the brute force guard.
//!
//! Credential checking itself belongs to the caller and is plugged in through
//! [`CredentialVerifier`]. This service only enforces the order of calls: a
//! locked account is rejected before its credentials are looked at, and every
//! verified outcome is reported to the guard exactly once.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error, LockoutStatus,
    error::AuthError,
    repositories::LoginAttemptRepository,
    services::BruteForceGuard,
};

/// Checks a username/password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// What a successful login yields, e.g. the authenticated user
    type Principal: Send;

    /// Verify credentials.
    ///
    /// # Returns
    ///
    /// `Ok(Some(_))` when the credentials are valid, `Ok(None)` when they are
    /// not, and `Err` when verification could not be performed at all.
    async fn verify(&self, username: &str, password: &str)
    -> Result<Option<Self::Principal>, Error>;
}

/// Service for username/password logins with lockout enforcement
pub struct AuthenticationService<V: CredentialVerifier, R: LoginAttemptRepository> {
    verifier: Arc<V>,
    guard: Arc<BruteForceGuard<R>>,
}

impl<V: CredentialVerifier, R: LoginAttemptRepository> AuthenticationService<V, R> {
    pub fn new(verifier: Arc<V>, guard: Arc<BruteForceGuard<R>>) -> Self {
        Self { verifier, guard }
    }

    pub fn guard(&self) -> &Arc<BruteForceGuard<R>> {
        &self.guard
    }

    /// Authenticate `username` with `password`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AccountLocked`] when the account is locked, either before
    ///   this call or as a result of this failure
    /// - [`AuthError::InvalidCredentials`] with the number of attempts left
    /// - any error from the verifier, in which case no attempt is recorded
    pub async fn login(&self, username: &str, password: &str) -> Result<V::Principal, Error> {
        // One snapshot decides both whether to reject and what to report
        let status = self.guard.lockout_status(username);
        if let Some(locked) = locked_error(&status) {
            tracing::debug!(username = %username, "Rejected login for locked account");
            return Err(locked);
        }

        match self.verifier.verify(username, password).await? {
            Some(principal) => {
                self.guard.register_successful_login(username).await;
                Ok(principal)
            }
            None => {
                let status = self.guard.register_failed_login(username).await;
                match locked_error(&status) {
                    Some(locked) => Err(locked),
                    None => Err(Error::Auth(AuthError::InvalidCredentials {
                        remaining_attempts: status.remaining_attempts,
                    })),
                }
            }
        }
    }
}

/// The locked-account error for `status`, or `None` if it is not locked
fn locked_error(status: &LockoutStatus) -> Option<Error> {
    let locked_until = status.locked_until.filter(|_| status.is_locked)?;
    Some(Error::Auth(AuthError::AccountLocked {
        locked_until,
        retry_after_seconds: status.retry_after_seconds().unwrap_or(0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LoginAttempt, LoginProtectionConfig, clock::ManualClock};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockLoginAttemptRepository {
        rows: Mutex<HashMap<String, LoginAttempt>>,
    }

    #[async_trait]
    impl LoginAttemptRepository for MockLoginAttemptRepository {
        async fn find_by_username(&self, username: &str) -> Result<Option<LoginAttempt>, Error> {
            Ok(self.rows.lock().unwrap().get(username).cloned())
        }

        async fn save(&self, attempt: &LoginAttempt) -> Result<LoginAttempt, Error> {
            self.rows
                .lock()
                .unwrap()
                .insert(attempt.username.clone(), attempt.clone());
            Ok(attempt.clone())
        }

        async fn delete_by_username(&self, username: &str) -> Result<(), Error> {
            self.rows.lock().unwrap().remove(username);
            Ok(())
        }

        async fn find_all_by_locked_until_after(
            &self,
            after: DateTime<Utc>,
        ) -> Result<Vec<LoginAttempt>, Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|a| a.locked_until.is_some_and(|until| until > after))
                .cloned()
                .collect())
        }
    }

    /// Accepts one fixed password and counts how often it was asked
    struct StaticVerifier {
        password: &'static str,
        calls: AtomicUsize,
        broken: bool,
    }

    impl StaticVerifier {
        fn new(password: &'static str) -> Self {
            Self {
                password,
                calls: AtomicUsize::new(0),
                broken: false,
            }
        }
    }

    #[async_trait]
    impl CredentialVerifier for StaticVerifier {
        type Principal = String;

        async fn verify(
            &self,
            username: &str,
            password: &str,
        ) -> Result<Option<Self::Principal>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(Error::Storage(crate::error::StorageError::Connection(
                    "user store unavailable".to_string(),
                )));
            }
            Ok((password == self.password).then(|| username.to_string()))
        }
    }

    fn setup(
        verifier: StaticVerifier,
    ) -> (
        AuthenticationService<StaticVerifier, MockLoginAttemptRepository>,
        Arc<StaticVerifier>,
        Arc<ManualClock>,
    ) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        let guard = Arc::new(BruteForceGuard::with_clock(
            Arc::new(MockLoginAttemptRepository::default()),
            LoginProtectionConfig::from_millis(5, 300_000),
            clock.clone(),
        ));
        let verifier = Arc::new(verifier);
        (
            AuthenticationService::new(verifier.clone(), guard),
            verifier,
            clock,
        )
    }

    #[tokio::test]
    async fn test_successful_login_returns_principal() {
        let (service, _, _) = setup(StaticVerifier::new("squats"));

        let principal = service.login("alice", "squats").await.unwrap();
        assert_eq!(principal, "alice");
    }

    #[tokio::test]
    async fn test_bad_password_reports_remaining_attempts() {
        let (service, _, _) = setup(StaticVerifier::new("squats"));

        let err = service.login("alice", "lunges").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(AuthError::InvalidCredentials {
                remaining_attempts: 4
            })
        ));
    }

    #[tokio::test]
    async fn test_threshold_failure_reports_locked() {
        let (service, _, _) = setup(StaticVerifier::new("squats"));

        for _ in 0..4 {
            service.login("alice", "lunges").await.unwrap_err();
        }
        let err = service.login("alice", "lunges").await.unwrap_err();

        assert!(err.is_account_locked());
    }

    #[tokio::test]
    async fn test_locked_account_skips_verification() {
        let (service, verifier, _) = setup(StaticVerifier::new("squats"));

        for _ in 0..5 {
            service.login("alice", "lunges").await.unwrap_err();
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 5);

        // Even the right password is rejected while locked
        let err = service.login("alice", "squats").await.unwrap_err();
        match err {
            Error::Auth(AuthError::AccountLocked {
                retry_after_seconds,
                ..
            }) => assert_eq!(retry_after_seconds, 300),
            other => panic!("Expected locked account, got {other:?}"),
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_locked_error_reports_lock_end_and_retry() {
        let (service, _, clock) = setup(StaticVerifier::new("squats"));

        for _ in 0..5 {
            service.login("alice", "lunges").await.unwrap_err();
        }
        clock.advance(Duration::seconds(90));

        match service.login("alice", "squats").await.unwrap_err() {
            Error::Auth(AuthError::AccountLocked {
                locked_until,
                retry_after_seconds,
            }) => {
                assert_eq!(
                    locked_until,
                    Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap()
                );
                assert_eq!(retry_after_seconds, 210);
            }
            other => panic!("Expected locked account, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_allowed_after_lock_expires() {
        let (service, _, clock) = setup(StaticVerifier::new("squats"));

        for _ in 0..5 {
            service.login("alice", "lunges").await.unwrap_err();
        }
        clock.advance(Duration::milliseconds(300_001));

        assert_eq!(service.login("alice", "squats").await.unwrap(), "alice");
        assert_eq!(service.guard().remaining_attempts("alice"), 5);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let (service, _, _) = setup(StaticVerifier::new("squats"));

        for _ in 0..3 {
            service.login("bob", "lunges").await.unwrap_err();
        }
        service.login("bob", "squats").await.unwrap();

        assert_eq!(service.guard().remaining_attempts("bob"), 5);
    }

    #[tokio::test]
    async fn test_verifier_error_records_nothing() {
        let mut verifier = StaticVerifier::new("squats");
        verifier.broken = true;
        let (service, _, _) = setup(verifier);

        let err = service.login("alice", "lunges").await.unwrap_err();

        assert!(err.is_storage_error());
        assert_eq!(service.guard().remaining_attempts("alice"), 5);
    }
}
