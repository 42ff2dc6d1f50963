//! Request Authentication Guard
//!
//! Middleware that turns a bearer access token into a request-scoped
//! [`Principal`]. The guard never rejects: a missing, malformed, expired,
//! or orphaned token simply means the request proceeds without a principal,
//! and the handler decides whether anonymous is acceptable. Exempt path
//! prefixes (the auth endpoints themselves) skip token resolution entirely.
//!
//! # Usage
//!
//! ```ignore
//! use axum::{middleware, Router};
//! use portcullis::guard::AuthGuard;
//!
//! let guard = AuthGuard::new(codec, directory);
//! let app = Router::new()
//!     .route("/api/me", get(me))
//!     .layer(middleware::from_fn_with_state(guard, portcullis::guard::authentication_guard));
//!
//! async fn me(principal: Option<Extension<Principal>>) -> impl IntoResponse { /* ... */ }
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::directory::UserDirectory;
use crate::token::TokenCodec;

// ============================================================================
// Principal
// ============================================================================

/// The authenticated identity attached to a request.
///
/// Built from the directory record, not the token claims, so a request
/// always sees the account's current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub nickname: String,
    pub onboarding_completed: bool,
}

// ============================================================================
// Guard
// ============================================================================

/// Shared state for the authentication middleware.
pub struct AuthGuard<D: UserDirectory> {
    codec: TokenCodec,
    directory: Arc<D>,
    exempt_prefixes: Vec<String>,
}

// Manual impl: the directory is shared through the Arc, so `D` itself does
// not need to be `Clone`.
impl<D: UserDirectory> Clone for AuthGuard<D> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            directory: Arc::clone(&self.directory),
            exempt_prefixes: self.exempt_prefixes.clone(),
        }
    }
}

impl<D: UserDirectory> AuthGuard<D> {
    /// Build a guard with the default exempt prefix (`/api/auth/`).
    pub fn new(codec: TokenCodec, directory: Arc<D>) -> Self {
        Self {
            codec,
            directory,
            exempt_prefixes: vec!["/api/auth/".to_string()],
        }
    }

    /// Replace the exempt path prefixes.
    pub fn with_exempt_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.exempt_prefixes = prefixes;
        self
    }

    /// Whether a request path skips token resolution.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_prefixes.iter().any(|p| path.starts_with(p))
    }

    /// Resolve an Authorization header value into a principal.
    ///
    /// Every failure mode collapses to `None`: wrong scheme, bad signature,
    /// expired claim, or a subject that no longer exists in the directory.
    pub fn resolve(&self, authorization: Option<&str>) -> Option<Principal> {
        let token = TokenCodec::strip_bearer(authorization?)?;
        let claims = self.codec.verify(token).ok()?;

        let user = self.directory.find_by_id(claims.subject).ok().flatten()?;
        Some(Principal {
            user_id: user.id,
            email: user.email,
            nickname: user.nickname,
            onboarding_completed: user.onboarding_completed,
        })
    }
}

/// Axum middleware wiring [`AuthGuard::resolve`] into the request pipeline.
///
/// Attaches a [`Principal`] extension when the bearer token resolves; always
/// forwards the request either way.
pub async fn authentication_guard<D: UserDirectory>(
    State(guard): State<AuthGuard<D>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !guard.is_exempt(request.uri().path()) {
        let authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(principal) = guard.resolve(authorization.as_deref()) {
            request.extensions_mut().insert(principal);
        }
    }

    next.run(request).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::directory::{InMemoryUserDirectory, NewUser};
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    fn fixtures() -> (TokenCodec, Arc<InMemoryUserDirectory>, String) {
        let config = AuthConfig::builder()
            .secret("unit-test-signing-key-with-plenty-of-length-0123456789")
            .build();
        let codec = TokenCodec::new(&config);

        let directory = Arc::new(InMemoryUserDirectory::new());
        let user = directory
            .create(NewUser {
                email: "a@x.com".to_string(),
                password_hash: "digest".to_string(),
                nickname: "alpha".to_string(),
                profile_image_url: None,
            })
            .unwrap();
        let token = codec.issue_access(&user);

        (codec, directory, token)
    }

    async fn whoami(principal: Option<Extension<Principal>>) -> String {
        match principal {
            Some(Extension(p)) => p.nickname,
            None => "anonymous".to_string(),
        }
    }

    fn app(guard: AuthGuard<InMemoryUserDirectory>) -> Router {
        Router::new()
            .route("/api/me", get(whoami))
            .route("/api/auth/login", get(whoami))
            .layer(middleware::from_fn_with_state(
                guard,
                authentication_guard::<InMemoryUserDirectory>,
            ))
    }

    async fn body_of(app: Router, path: &str, bearer: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(path);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_attaches_principal() {
        let (codec, directory, token) = fixtures();
        let app = app(AuthGuard::new(codec, directory));

        let (status, body) = body_of(app, "/api/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alpha");
    }

    #[tokio::test]
    async fn test_missing_token_proceeds_anonymously() {
        let (codec, directory, _) = fixtures();
        let app = app(AuthGuard::new(codec, directory));

        let (status, body) = body_of(app, "/api/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_garbage_token_proceeds_anonymously() {
        let (codec, directory, _) = fixtures();
        let app = app(AuthGuard::new(codec, directory));

        let (status, body) = body_of(app, "/api/me", Some("not.a.token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_foreign_signature_proceeds_anonymously() {
        let (codec, directory, _) = fixtures();

        let other_config = AuthConfig::builder()
            .secret("a-completely-different-signing-key-0987654321-zyxwv")
            .build();
        let other_codec = TokenCodec::new(&other_config);
        let user = directory.find_by_id(1).unwrap().unwrap();
        let forged = other_codec.issue_access(&user);

        let app = app(AuthGuard::new(codec, directory));
        let (_, body) = body_of(app, "/api/me", Some(&forged)).await;
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_exempt_path_skips_resolution() {
        let (codec, directory, token) = fixtures();
        let app = app(AuthGuard::new(codec, directory));

        // Even with a valid token, the exempt path sees no principal.
        let (status, body) = body_of(app, "/api/auth/login", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_wrong_scheme_proceeds_anonymously() {
        let (codec, directory, token) = fixtures();
        let guard = AuthGuard::new(codec, directory);

        // Direct resolve: scheme must be exactly "Bearer ".
        assert!(guard.resolve(Some(&format!("Basic {}", token))).is_none());
        assert!(guard.resolve(None).is_none());
    }

    #[test]
    fn test_resolve_reads_current_directory_state() {
        let (codec, directory, token) = fixtures();
        let guard = AuthGuard::new(codec, Arc::clone(&directory));

        let principal = guard
            .resolve(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(principal.user_id, 1);
        assert_eq!(principal.email, "a@x.com");
    }

    #[test]
    fn test_guard_clone_shares_directory() {
        // The directory type itself is not Clone; the guard must clone
        // through the Arc so it can serve as middleware state.
        let (codec, directory, token) = fixtures();
        let guard = AuthGuard::new(codec, Arc::clone(&directory));
        let cloned = guard.clone();

        let header = format!("Bearer {}", token);
        assert_eq!(
            guard.resolve(Some(&header)),
            cloned.resolve(Some(&header))
        );

        // A user created after the clone is visible through both handles.
        directory
            .create(NewUser {
                email: "b@x.com".to_string(),
                password_hash: "digest".to_string(),
                nickname: "beta".to_string(),
                profile_image_url: None,
            })
            .unwrap();
        assert!(cloned.directory.find_by_id(2).unwrap().is_some());
    }

    #[test]
    fn test_exempt_prefix_matching() {
        let (codec, directory, _) = fixtures();
        let guard = AuthGuard::new(codec, directory)
            .with_exempt_prefixes(vec!["/health".to_string(), "/api/auth/".to_string()]);

        assert!(guard.is_exempt("/health"));
        assert!(guard.is_exempt("/api/auth/refresh"));
        assert!(!guard.is_exempt("/api/me"));
    }
}
