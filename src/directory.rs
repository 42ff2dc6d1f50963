//! User Directory
//!
//! The account records behind authentication: id, email, credential digest,
//! profile fields. Email lookup and uniqueness are case-insensitive, so
//! `A@x.com` and `a@x.com` are the same account; nicknames compare exactly
//! as stored.
//!
//! # Storage Note
//!
//! [`UserDirectory`] is the seam for a persistent user table. The bundled
//! [`InMemoryUserDirectory`] assigns sequential ids from a `RwLock`-guarded
//! map and is intended for single-process use and tests.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

// ============================================================================
// Records
// ============================================================================

/// A stored user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    /// Stored as given at signup; compared case-insensitively
    pub email: String,
    /// bcrypt digest, never the plaintext
    pub password_hash: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

// ============================================================================
// Directory Trait
// ============================================================================

/// Error from a user directory backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectoryError {
    /// An account with this email already exists (case-insensitive)
    #[error("email already registered")]
    DuplicateEmail,
    /// An account with this nickname already exists
    #[error("nickname already taken")]
    DuplicateNickname,
    /// No account matches the given id
    #[error("user not found")]
    NotFound,
    /// Backend failure
    #[error("user directory backend error: {0}")]
    Backend(String),
}

/// Storage seam for user accounts.
pub trait UserDirectory: Send + Sync {
    /// Create a user, enforcing email and nickname uniqueness.
    fn create(&self, new_user: NewUser) -> Result<User, DirectoryError>;

    /// Find a user by email, case-insensitively.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Find a user by id.
    fn find_by_id(&self, id: i64) -> Result<Option<User>, DirectoryError>;

    /// Whether an account with this email exists (case-insensitive).
    fn email_exists(&self, email: &str) -> Result<bool, DirectoryError>;

    /// Whether an account with this nickname exists (exact match).
    fn nickname_exists(&self, nickname: &str) -> Result<bool, DirectoryError>;

    /// Record a successful login time for a user.
    fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DirectoryError>;
}

// ============================================================================
// In-Memory Directory
// ============================================================================

/// Map-backed [`UserDirectory`] with sequential id assignment.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().users.is_empty()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn create(&self, new_user: NewUser) -> Result<User, DirectoryError> {
        let mut inner = self.inner.write();

        let email_lower = new_user.email.to_lowercase();
        if inner
            .users
            .values()
            .any(|u| u.email.to_lowercase() == email_lower)
        {
            return Err(DirectoryError::DuplicateEmail);
        }
        if inner.users.values().any(|u| u.nickname == new_user.nickname) {
            return Err(DirectoryError::DuplicateNickname);
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            nickname: new_user.nickname,
            profile_image_url: new_user.profile_image_url,
            onboarding_completed: false,
            created_at: Utc::now(),
            last_login_at: None,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let email_lower = email.to_lowercase();
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email_lower)
            .cloned())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>, DirectoryError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    fn email_exists(&self, email: &str) -> Result<bool, DirectoryError> {
        Ok(self.find_by_email(email)?.is_some())
    }

    fn nickname_exists(&self, nickname: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .any(|u| u.nickname == nickname))
    }

    fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DirectoryError> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(&id).ok_or(DirectoryError::NotFound)?;
        user.last_login_at = Some(at);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
