//! Configuration for login brute force protection.

use chrono::Duration;

use crate::{Error, error::ValidationError};

/// Default number of consecutive failures before an account locks
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Default lockout window, measured from the first failure of the window
pub const DEFAULT_LOCKOUT_DURATION_MILLIS: i64 = 300_000;

/// Default upper bound for a single durable store call
pub const DEFAULT_STORE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Configuration for the brute force guard.
///
/// Values are fixed once the guard is constructed; there is no per-username
/// override.
///
/// # Example
///
/// ```rust
/// use spotter_core::LoginProtectionConfig;
///
/// let config = LoginProtectionConfig::from_millis(5, 300_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginProtectionConfig {
    /// When false the guard never blocks and records nothing
    pub enabled: bool,
    /// Failures that lock the account
    pub max_login_attempts: u32,
    /// How long a lock lasts, counted from the first failure of the window
    pub lockout_duration: Duration,
    /// Timeout applied to each durable store call
    pub store_timeout: std::time::Duration,
}

impl Default for LoginProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_duration: Duration::milliseconds(DEFAULT_LOCKOUT_DURATION_MILLIS),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl LoginProtectionConfig {
    /// Build a config from the `maxLoginAttempts` / `lockoutDurationMillis` pair
    pub fn from_millis(max_login_attempts: u32, lockout_duration_millis: i64) -> Self {
        Self {
            max_login_attempts,
            lockout_duration: Duration::milliseconds(lockout_duration_millis),
            ..Default::default()
        }
    }

    /// A config with protection turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_max_login_attempts(mut self, max_login_attempts: u32) -> Self {
        self.max_login_attempts = max_login_attempts;
        self
    }

    pub fn with_lockout_duration(mut self, lockout_duration: Duration) -> Self {
        self.lockout_duration = lockout_duration;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: std::time::Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Check that every value is usable.
    ///
    /// A disabled config is not validated, since none of its values are read.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] naming the first unusable field.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_login_attempts == 0 {
            return Err(ValidationError::InvalidField(
                "max_login_attempts must be positive".to_string(),
            )
            .into());
        }
        if self.lockout_duration <= Duration::zero() {
            return Err(ValidationError::InvalidField(
                "lockout_duration must be positive".to_string(),
            )
            .into());
        }
        if self.store_timeout.is_zero() {
            return Err(ValidationError::InvalidField(
                "store_timeout must be positive".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
