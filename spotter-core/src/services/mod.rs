//! Service layer for business logic
//!
//! This module contains the login protection guard and the login flow built on it.

pub mod authentication;
pub mod brute_force;

pub use authentication::{AuthenticationService, CredentialVerifier};
pub use brute_force::BruteForceGuard;
