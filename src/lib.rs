//! # Portcullis
//!
//! Credential authentication and session management for Axum applications.
//!
//! Two token kinds with deliberately different trust models:
//!
//! - **Access tokens** are short-lived, self-contained, and verified by
//!   signature alone. No storage lookup on the hot path.
//! - **Refresh tokens** are long-lived, single-use, and backed by a
//!   server-side session row keyed by the token's SHA-256 fingerprint.
//!   Spending one atomically replaces its row, so a replayed token is dead
//!   on arrival and logout actually revokes.
//!
//! ## Features
//!
//! - **Signup and Login**: bcrypt credential hashing, uniform failure for
//!   unknown email vs wrong password
//! - **Refresh Rotation**: single-use refresh tokens, atomic rotation,
//!   replay rejection
//! - **Revocation**: per-session logout and logout-everywhere
//! - **Request Guard**: middleware resolving bearer tokens to a [`Principal`],
//!   never rejecting on its own
//! - **Security Events**: structured audit logging with tracing
//! - **Secret Hygiene**: signing-secret strength validation at load time
//!
//! ## Quick Start
//!
//! ```ignore
//! use portcullis::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     portcullis::observability::init();
//!
//!     let config = AuthConfig::from_env()?;
//!     let service = AuthService::new(
//!         &config,
//!         InMemoryUserDirectory::new(),
//!         InMemorySessionStore::new(),
//!     )?;
//!
//!     let issued = service.signup(SignupRequest {
//!         email: "a@x.com".into(),
//!         password: "correct horse battery staple".into(),
//!         nickname: "alpha".into(),
//!         profile_image_url: None,
//!     })?;
//!
//!     let rotated = service.refresh(&issued.refresh_token)?;
//!     assert!(service.refresh(&issued.refresh_token).is_err()); // single use
//!     let _ = rotated;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod guard;
pub mod observability;
pub mod password;
pub mod secret;
pub mod service;
pub mod session;
pub mod token;
pub mod validation;

// Re-exports
pub use config::{AuthConfig, AuthConfigBuilder, ConfigError};
pub use directory::{InMemoryUserDirectory, NewUser, User, UserDirectory};
pub use error::{AuthError, ErrorResponse};
pub use guard::{authentication_guard, AuthGuard, Principal};
pub use password::PasswordHasher;
pub use secret::{generate_secret, SecretPolicy};
pub use service::{AuthResponse, AuthService, LoginRequest, SignupRequest, UserProfile};
pub use session::{InMemorySessionStore, RefreshSession, SessionStore};
pub use token::{TokenCodec, TokenError, VerifiedClaims};

/// Everything an embedding application typically needs.
pub mod prelude {
    pub use crate::config::AuthConfig;
    pub use crate::directory::{InMemoryUserDirectory, UserDirectory};
    pub use crate::error::AuthError;
    pub use crate::guard::{authentication_guard, AuthGuard, Principal};
    pub use crate::service::{AuthService, LoginRequest, SignupRequest};
    pub use crate::session::{InMemorySessionStore, SessionStore};
    pub use crate::token::TokenCodec;
}
