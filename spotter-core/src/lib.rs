//! Core functionality for spotter
//!
//! Spotter protects username/password logins against brute force attacks. It
//! counts failed logins per username, locks an account for a fixed window once
//! a threshold is reached, and keeps active locks across restarts.
//!
//! See [`BruteForceGuard`](services::BruteForceGuard) for the guard,
//! [`LoginAttempt`] for the tracked state and
//! [`LoginAttemptRepository`](repositories::LoginAttemptRepository) for the
//! interface storage backends implement.
pub mod attempt;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod repositories;
pub mod services;

pub use attempt::{LockoutStatus, LoginAttempt};
pub use cache::AttemptCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LoginProtectionConfig;
pub use error::Error;
pub use repositories::RepositoryProvider;
