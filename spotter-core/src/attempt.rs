//! Failed login attempt records and lockout state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Failed login state for a single username.
///
/// One record exists per username that has failed to log in since its last
/// successful login. The record is the unit stored both in the
/// [`AttemptCache`](crate::AttemptCache) and in the durable
/// [`LoginAttemptRepository`](crate::repositories::LoginAttemptRepository).
///
/// # Invariants
///
/// - `attempt_count >= 1`
/// - `first_attempt_at <= last_attempt_at`
/// - `locked_until`, once set, is `first_attempt_at + lockout_duration` and is
///   never moved by later failures in the same window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub username: String,
    pub attempt_count: u32,
    pub first_attempt_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    /// Start a new attempt window with a single failure at `now`.
    ///
    /// The window locks immediately when `max_login_attempts` is 1.
    pub fn new(
        username: impl Into<String>,
        now: DateTime<Utc>,
        max_login_attempts: u32,
        lockout_duration: Duration,
    ) -> Self {
        let mut attempt = Self {
            username: username.into(),
            attempt_count: 1,
            first_attempt_at: now,
            last_attempt_at: now,
            locked_until: None,
        };
        attempt.apply_threshold(max_login_attempts, lockout_duration);
        attempt
    }

    /// Whether the lock is in force at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Whether the lock has run out at `now`.
    ///
    /// An expired record must be treated as if it did not exist.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until <= now)
    }

    /// Apply one more failure at `now`.
    ///
    /// An expired record restarts as a fresh window instead of continuing the
    /// old count.
    pub fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        max_login_attempts: u32,
        lockout_duration: Duration,
    ) {
        if self.is_expired_at(now) {
            *self = Self::new(
                std::mem::take(&mut self.username),
                now,
                max_login_attempts,
                lockout_duration,
            );
            return;
        }

        self.attempt_count = self.attempt_count.saturating_add(1);
        self.last_attempt_at = now;
        self.apply_threshold(max_login_attempts, lockout_duration);
    }

    /// Time left until the lock lifts, if locked at `now`
    pub fn retry_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    fn apply_threshold(&mut self, max_login_attempts: u32, lockout_duration: Duration) {
        if self.locked_until.is_none() && self.attempt_count >= max_login_attempts {
            self.locked_until = Some(self.first_attempt_at + lockout_duration);
        }
    }
}

/// Snapshot of an account's lockout state, for display to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub username: String,
    pub failed_attempts: u32,
    pub remaining_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    #[serde(skip)]
    evaluated_at: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    /// Status of a username with no live record.
    pub fn unlocked(username: impl Into<String>, max_login_attempts: u32) -> Self {
        Self {
            username: username.into(),
            failed_attempts: 0,
            remaining_attempts: max_login_attempts,
            is_locked: false,
            locked_until: None,
            evaluated_at: None,
        }
    }

    /// Derive the status from a record as seen at `now`.
    pub fn from_attempt(
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
        max_login_attempts: u32,
    ) -> Self {
        if attempt.is_expired_at(now) {
            return Self::unlocked(attempt.username.clone(), max_login_attempts);
        }

        let is_locked = attempt.is_locked_at(now);
        Self {
            username: attempt.username.clone(),
            failed_attempts: attempt.attempt_count,
            remaining_attempts: max_login_attempts.saturating_sub(attempt.attempt_count),
            is_locked,
            locked_until: if is_locked { attempt.locked_until } else { None },
            evaluated_at: Some(now),
        }
    }

    /// Seconds until the account can try again, rounded up. `None` if not locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        let until = self.locked_until?;
        let now = self.evaluated_at.unwrap_or_else(Utc::now);
        let millis = (until - now).num_milliseconds().max(0);
        Some((millis + 999) / 1000)
    }
}
