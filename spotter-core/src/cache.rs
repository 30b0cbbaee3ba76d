//! In-memory attempt cache.
//!
//! The cache is the runtime source of truth for login protection. It is read
//! on every login request and never consults the durable store.

use dashmap::DashMap;

use crate::LoginAttempt;

/// Concurrent username → [`LoginAttempt`] map.
///
/// Entries are never evicted by the cache itself; whether a record still
/// matters is decided by the caller from its `locked_until`.
#[derive(Debug, Default)]
pub struct AttemptCache {
    attempts: DashMap<String, LoginAttempt>,
}

impl AttemptCache {
    pub fn new() -> Self {
        Self {
            attempts: DashMap::new(),
        }
    }

    pub fn get(&self, username: &str) -> Option<LoginAttempt> {
        self.attempts.get(username).map(|entry| entry.value().clone())
    }

    pub fn put(&self, attempt: LoginAttempt) {
        self.attempts.insert(attempt.username.clone(), attempt);
    }

    pub fn remove(&self, username: &str) -> Option<LoginAttempt> {
        self.attempts.remove(username).map(|(_, attempt)| attempt)
    }

    /// Atomically create or modify the record for `username`.
    ///
    /// `insert` builds the record when none exists, `modify` mutates an existing
    /// one. The shard holding `username` stays write-locked until the closure
    /// returns, so concurrent updates to the same key are serialized while
    /// other keys proceed in parallel. Returns a copy of the resulting record.
    pub fn update<I, M>(&self, username: &str, insert: I, modify: M) -> LoginAttempt
    where
        I: FnOnce() -> LoginAttempt,
        M: FnOnce(&mut LoginAttempt),
    {
        self.attempts
            .entry(username.to_string())
            .and_modify(modify)
            .or_insert_with(insert)
            .value()
            .clone()
    }

    /// Replace the whole cache content with `attempts`.
    pub fn replace_all(&self, attempts: impl IntoIterator<Item = LoginAttempt>) {
        self.attempts.clear();
        for attempt in attempts {
            self.put(attempt);
        }
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
