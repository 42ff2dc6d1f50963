//! Authentication Service
//!
//! The orchestration core tying directory, session store, token codec, and
//! password hasher together: signup, login, refresh-with-rotation, logout,
//! and logout-everywhere.
//!
//! # Design Philosophy
//!
//! Refresh tokens are single use. Spending one is an atomic removal of its
//! session row; whoever gets the row back wins, everyone else is rejected.
//! A replayed token therefore fails not because of bookkeeping flags but
//! because the row it pointed at no longer exists.
//!
//! Login answers the same way for an unknown email and a wrong password,
//! and burns a bcrypt verification in both paths so the two failures cost
//! comparable time.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::prelude::*;
//!
//! let config = AuthConfig::from_env()?;
//! let service = AuthService::new(
//!     &config,
//!     InMemoryUserDirectory::new(),
//!     InMemorySessionStore::new(),
//! )?;
//!
//! let issued = service.signup(SignupRequest {
//!     email: "a@x.com".into(),
//!     password: "correct horse battery staple".into(),
//!     nickname: "alpha".into(),
//!     profile_image_url: None,
//! })?;
//! let rotated = service.refresh(&issued.refresh_token)?;
//! ```

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;

use crate::config::AuthConfig;
use crate::directory::{NewUser, User, UserDirectory};
use crate::error::AuthError;
use crate::observability::SecurityEvent;
use crate::password::{PasswordHashError, PasswordHasher};
use crate::security_event;
use crate::session::{RefreshSession, SessionStore};
use crate::token::TokenCodec;
use crate::validation::{validate_email, validate_length, validate_max_bytes};

// ============================================================================
// Requests and Responses
// ============================================================================

/// Input to [`AuthService::signup`].
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

/// Input to [`AuthService::login`].
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account. Never carries the credential digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
    pub onboarding_completed: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            profile_image_url: user.profile_image_url.clone(),
            onboarding_completed: user.onboarding_completed,
        }
    }
}

/// A freshly issued token pair plus the owning user's profile.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

// Signup field bounds. The password maximum is in bytes: bcrypt hashes at
// most 72 bytes and silently truncates the rest.
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX_BYTES: usize = 72;
const NICKNAME_MIN: usize = 2;
const NICKNAME_MAX: usize = 20;

// ============================================================================
// Service
// ============================================================================

/// Credential and session engine, generic over its two storage seams.
pub struct AuthService<D: UserDirectory, S: SessionStore> {
    directory: D,
    sessions: S,
    codec: TokenCodec,
    hasher: PasswordHasher,
    refresh_ttl: ChronoDuration,
    // Verified against when the email is unknown, so that path costs a
    // bcrypt check too.
    dummy_digest: String,
}

impl<D: UserDirectory, S: SessionStore> AuthService<D, S> {
    /// Build a service from loaded configuration and storage backends.
    pub fn new(config: &AuthConfig, directory: D, sessions: S) -> Result<Self, PasswordHashError> {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let dummy_digest = hasher.hash("timing-equalizer")?;
        Ok(Self {
            directory,
            sessions,
            codec: TokenCodec::new(config),
            hasher,
            refresh_ttl: ChronoDuration::seconds(config.refresh_token_ttl.as_secs() as i64),
            dummy_digest,
        })
    }

    /// Register a new account and open its first session.
    ///
    /// Validates input, enforces email (case-insensitive) and nickname
    /// uniqueness, hashes the password, then issues a token pair as if the
    /// user had logged in.
    pub fn signup(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        validate_email(&request.email)?;
        validate_length(&request.password, PASSWORD_MIN, PASSWORD_MAX_BYTES, "password")?;
        validate_max_bytes(&request.password, PASSWORD_MAX_BYTES, "password")?;
        validate_length(&request.nickname, NICKNAME_MIN, NICKNAME_MAX, "nickname")?;

        if self.directory.email_exists(&request.email)? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.directory.nickname_exists(&request.nickname)? {
            return Err(AuthError::DuplicateNickname);
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self.directory.create(NewUser {
            email: request.email,
            password_hash,
            nickname: request.nickname,
            profile_image_url: request.profile_image_url,
        })?;

        security_event!(
            SecurityEvent::UserRegistered,
            user_id = user.id,
            "New user registered"
        );

        self.open_session(&user)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password return the same
    /// [`AuthError::InvalidCredentials`]; the unknown-email path still runs
    /// a digest verification. A successful login records the login time and
    /// sweeps the user's expired session rows.
    pub fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = match self.directory.find_by_email(&request.email)? {
            Some(user) => user,
            None => {
                self.hasher.verify(&request.password, &self.dummy_digest);
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    reason = "unknown_email",
                    "Login failed"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(&request.password, &user.password_hash) {
            security_event!(
                SecurityEvent::AuthenticationFailure,
                user_id = user.id,
                reason = "wrong_password",
                "Login failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        self.directory.touch_last_login(user.id, Utc::now())?;

        let swept = self.sessions.delete_expired_for_user(user.id)?;
        if swept > 0 {
            security_event!(
                SecurityEvent::SessionDestroyed,
                user_id = user.id,
                count = swept,
                "Swept expired refresh sessions at login"
            );
        }

        security_event!(
            SecurityEvent::AuthenticationSuccess,
            user_id = user.id,
            "User authenticated"
        );

        self.open_session(&user)
    }

    /// Spend a refresh token and issue a replacement pair.
    ///
    /// The presented token must verify and its session row must still exist.
    /// The row is removed atomically before anything new is issued, so a
    /// replayed token, including the loser of a concurrent race, gets
    /// [`AuthError::InvalidToken`]. A row past its server-side expiry is
    /// consumed and rejected with [`AuthError::ExpiredToken`].
    pub fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        if let Err(err) = self.codec.verify(refresh_token) {
            security_event!(
                SecurityEvent::RefreshRejected,
                reason = %err,
                "Refresh token failed verification"
            );
            return Err(err.into());
        }

        let fingerprint = self.codec.fingerprint(refresh_token);
        let session = match self.sessions.delete_by_fingerprint(&fingerprint)? {
            Some(session) => session,
            None => {
                security_event!(
                    SecurityEvent::RefreshRejected,
                    reason = "no_session",
                    "Refresh token has no live session"
                );
                return Err(AuthError::InvalidToken);
            }
        };

        if session.is_expired() {
            security_event!(
                SecurityEvent::RefreshRejected,
                user_id = session.user_id,
                reason = "session_expired",
                "Refresh session past server-side expiry"
            );
            return Err(AuthError::ExpiredToken);
        }

        let user = self
            .directory
            .find_by_id(session.user_id)?
            .ok_or(AuthError::UserNotFound)?;

        let response = self.open_session(&user)?;

        security_event!(
            SecurityEvent::SessionRotated,
            user_id = user.id,
            "Refresh session rotated"
        );

        Ok(response)
    }

    /// Revoke the session behind a refresh token.
    ///
    /// Best effort: an invalid, expired, or already-spent token is not an
    /// error, and a store failure is logged rather than surfaced. Logout
    /// always succeeds from the caller's side.
    pub fn logout(&self, refresh_token: &str) {
        let fingerprint = self.codec.fingerprint(refresh_token);
        match self.sessions.delete_by_fingerprint(&fingerprint) {
            Ok(Some(session)) => {
                security_event!(
                    SecurityEvent::Logout,
                    user_id = session.user_id,
                    "User logged out"
                );
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "Logout session delete failed");
            }
        }
    }

    /// Revoke every session a user holds. Returns the count revoked.
    pub fn logout_all(&self, user_id: i64) -> Result<usize, AuthError> {
        let revoked = self.sessions.delete_all_for_user(user_id)?;
        security_event!(
            SecurityEvent::SessionDestroyed,
            user_id = user_id,
            count = revoked,
            "All sessions revoked"
        );
        Ok(revoked)
    }

    /// Whether an account with this email exists (case-insensitive).
    pub fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.directory.email_exists(email)?)
    }

    /// Whether an account with this nickname exists (exact match).
    pub fn nickname_exists(&self, nickname: &str) -> Result<bool, AuthError> {
        Ok(self.directory.nickname_exists(nickname)?)
    }

    /// The codec this service signs with, for guard construction.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Borrow the user directory, for guard construction.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Issue a token pair for a user and persist the refresh session.
    fn open_session(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self.codec.issue_access(user);
        let refresh_token = self.codec.issue_refresh(user);

        // Row expiry mirrors the claim in the token it fingerprints; the
        // fallback recomputes it from the same configured TTL.
        let expires_at = self
            .codec
            .expires_at(&refresh_token)
            .unwrap_or_else(|| Utc::now() + self.refresh_ttl);

        self.sessions.save(RefreshSession {
            fingerprint: self.codec.fingerprint(&refresh_token),
            user_id: user.id,
            expires_at,
            created_at: Utc::now(),
        })?;

        security_event!(
            SecurityEvent::SessionCreated,
            user_id = user.id,
            "Refresh session created"
        );

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: UserProfile::from(user),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
