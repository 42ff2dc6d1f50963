//! Refresh Session Storage
//!
//! Server-side session rows for issued refresh tokens, keyed by token
//! fingerprint. A refresh token is only as good as its row: delete the row
//! and the token is dead, whatever its signature and expiry claim say. That
//! is what makes refresh tokens revocable when access tokens are not.
//!
//! # Storage Note
//!
//! The [`SessionStore`] trait is the seam for a persistent backend. The
//! bundled [`InMemorySessionStore`] keeps rows in a `RwLock`-guarded map,
//! which is correct for a single process and for tests; a multi-instance
//! deployment wants a shared backend behind the same trait.
//!
//! Rotation safety hangs on one primitive: [`SessionStore::delete_by_fingerprint`]
//! removes the row and returns it in a single atomic step, so when two
//! requests race to spend the same refresh token exactly one of them gets
//! the row back and the other sees `None`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

// ============================================================================
// Session Row
// ============================================================================

/// A stored refresh session.
///
/// Holds the fingerprint of the issued refresh token, never the token itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSession {
    /// SHA-256 hex fingerprint of the raw refresh token
    pub fingerprint: String,
    /// Owning user id
    pub user_id: i64,
    /// Independent server-side expiry, kept in lockstep with the token claim
    pub expires_at: DateTime<Utc>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Whether the row's server-side expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Error from a session store backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A row with this fingerprint already exists
    #[error("refresh session fingerprint already stored")]
    DuplicateFingerprint,
    /// Backend failure
    #[error("session store backend error: {0}")]
    Backend(String),
}

/// Storage seam for refresh sessions.
///
/// Implementations must make `delete_by_fingerprint` atomic: under
/// concurrent calls with the same fingerprint, exactly one caller receives
/// the row.
pub trait SessionStore: Send + Sync {
    /// Insert a new session row.
    fn save(&self, session: RefreshSession) -> Result<(), StoreError>;

    /// Look up a session by fingerprint without removing it.
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<RefreshSession>, StoreError>;

    /// Atomically remove a session by fingerprint, returning the removed row.
    ///
    /// `None` means the row did not exist, which callers treat as an
    /// already-spent or revoked token.
    fn delete_by_fingerprint(&self, fingerprint: &str)
        -> Result<Option<RefreshSession>, StoreError>;

    /// Remove every session belonging to a user. Returns the count removed.
    fn delete_all_for_user(&self, user_id: i64) -> Result<usize, StoreError>;

    /// Remove a user's sessions whose server-side expiry has passed.
    /// Returns the count removed.
    fn delete_expired_for_user(&self, user_id: i64) -> Result<usize, StoreError>;

    /// Count a user's live (unexpired) sessions.
    fn count_valid_for_user(&self, user_id: i64) -> Result<usize, StoreError>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Map-backed [`SessionStore`] for single-process use and tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, RefreshSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total row count, expired rows included.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, session: RefreshSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.fingerprint) {
            return Err(StoreError::DuplicateFingerprint);
        }
        sessions.insert(session.fingerprint.clone(), session);
        Ok(())
    }

    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<RefreshSession>, StoreError> {
        Ok(self.sessions.read().get(fingerprint).cloned())
    }

    fn delete_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<RefreshSession>, StoreError> {
        // Single write-lock remove: only one racing caller gets the row.
        Ok(self.sessions.write().remove(fingerprint))
    }

    fn delete_all_for_user(&self, user_id: i64) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(before - sessions.len())
    }

    fn delete_expired_for_user(&self, user_id: i64) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id || s.expires_at >= now);
        Ok(before - sessions.len())
    }

    fn count_valid_for_user(&self, user_id: i64) -> Result<usize, StoreError> {
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id && s.expires_at >= now)
            .count())
    }
}

// ============================================================================
// Tests
// ============================================================================
