//! Token Codec
//!
//! Issues and verifies compact signed tokens (three dot-separated base64url
//! segments: header, claims, signature) with HMAC-SHA-256, and derives the
//! one-way fingerprint under which refresh tokens are stored.
//!
//! # Design Philosophy
//!
//! Access tokens are self-contained: signature plus expiry claim decide
//! validity, no storage lookup. Refresh tokens carry no PII, only `sub`,
//! timing claims, and a random `jti`; their real authority comes from the
//! matching session row, and an intercepted one should leak nothing. The
//! store never sees a raw refresh token, only its SHA-256 fingerprint.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::token::TokenCodec;
//!
//! let codec = TokenCodec::new(&config);
//! let access = codec.issue_access(&user);
//! let claims = codec.verify(&access)?;
//! assert_eq!(claims.subject, user.id);
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::directory::User;

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// Errors and Claims
// ============================================================================

/// Token verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Token does not parse as three base64url JSON-bearing segments
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the configured secret
    #[error("bad token signature")]
    BadSignature,
    /// Expiry claim is in the past
    #[error("expired token claim")]
    Expired,
}

/// Claims recovered from a successfully verified token.
///
/// Identity fields are `None` for refresh tokens, which carry no PII.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    /// Subject: the owning user id
    pub subject: i64,
    /// Email (access tokens only)
    pub email: Option<String>,
    /// Nickname (access tokens only)
    pub nickname: Option<String>,
    /// Onboarding flag (access tokens only)
    pub onboarding_completed: Option<bool>,
    /// Issued-at, unix seconds
    pub issued_at: i64,
    /// Expiry, unix seconds
    pub expires_at: i64,
}

#[derive(Deserialize)]
struct RawClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    onboarding_completed: Option<bool>,
    iat: i64,
    exp: i64,
}

// ============================================================================
// Token Codec
// ============================================================================

/// Signs and verifies compact tokens with a symmetric key loaded once at
/// process start.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenCodec {
    /// Build a codec from loaded configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: config.secret.as_bytes().to_vec(),
            access_ttl_secs: config.access_token_ttl.as_secs() as i64,
            refresh_ttl_secs: config.refresh_token_ttl.as_secs() as i64,
        }
    }

    /// Issue a self-contained access token for a user.
    ///
    /// Claims: subject, email, nickname, onboarding flag, issued-at, expiry
    /// (issued-at + configured access TTL), and a random `jti`.
    pub fn issue_access(&self, user: &User) -> String {
        let iat = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "nickname": user.nickname,
            "onboarding_completed": user.onboarding_completed,
            "jti": random_token_id(),
            "iat": iat,
            "exp": iat + self.access_ttl_secs,
        });
        self.encode(&claims)
    }

    /// Issue a refresh token for a user.
    ///
    /// Minimal claim set: subject, issued-at, expiry, random `jti`.
    pub fn issue_refresh(&self, user: &User) -> String {
        let iat = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": user.id.to_string(),
            "jti": random_token_id(),
            "iat": iat,
            "exp": iat + self.refresh_ttl_secs,
        });
        self.encode(&claims)
    }

    /// Verify a token and return its claims.
    ///
    /// Checks run structural parse, then signature, then expiry, so callers
    /// get the most specific failure: [`TokenError::Malformed`] for anything
    /// that does not parse, [`TokenError::BadSignature`] for a parseable
    /// token signed with a different key, [`TokenError::Expired`] for a
    /// genuine token past its `exp` claim.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, sig_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: serde_json::Value =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if header.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
            return Err(TokenError::Malformed);
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Malformed)?;
        let raw: RawClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;
        let subject: i64 = raw.sub.parse().map_err(|_| TokenError::Malformed)?;

        let given_sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        let expected_sig = self.sign(signing_input.as_bytes());

        // Constant-time comparison: signature checks must not leak how many
        // leading bytes matched.
        if !bool::from(expected_sig.as_slice().ct_eq(given_sig.as_slice())) {
            return Err(TokenError::BadSignature);
        }

        if raw.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedClaims {
            subject,
            email: raw.email,
            nickname: raw.nickname,
            onboarding_completed: raw.onboarding_completed,
            issued_at: raw.iat,
            expires_at: raw.exp,
        })
    }

    /// Convenience wrapper over [`verify`](Self::verify) swallowing the error.
    pub fn is_valid(&self, token: &str) -> bool {
        self.verify(token).is_ok()
    }

    /// One-way fingerprint of a raw token: SHA-256, lowercase hex.
    ///
    /// Used as the storage and lookup key for refresh sessions so raw tokens
    /// are never persisted.
    pub fn fingerprint(&self, token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Subject id of a valid token, `None` if verification fails.
    pub fn subject_of(&self, token: &str) -> Option<i64> {
        self.verify(token).ok().map(|c| c.subject)
    }

    /// Expiry timestamp of a valid token, `None` if verification fails.
    pub fn expires_at(&self, token: &str) -> Option<DateTime<Utc>> {
        let claims = self.verify(token).ok()?;
        DateTime::<Utc>::from_timestamp(claims.expires_at, 0)
    }

    /// Strip the `Bearer ` scheme from an Authorization header value.
    pub fn strip_bearer(header_value: &str) -> Option<&str> {
        header_value.strip_prefix("Bearer ")
    }

    /// Encode header + claims and append the signature segment.
    fn encode(&self, claims: &serde_json::Value) -> String {
        let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });

        let mut token = String::new();
        token.push_str(&URL_SAFE_NO_PAD.encode(header.to_string()));
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(claims.to_string()));

        let sig = self.sign(token.as_bytes());
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(sig));
        token
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length; construction cannot fail.
        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => unreachable!(),
        };
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Random `jti` claim value, 128 bits of hex.
///
/// Timing claims have one-second resolution, so without this two tokens
/// minted for the same user in the same second would be byte-identical and
/// share a fingerprint, which breaks rotation: the session store keys rows
/// on the fingerprint, and spending a token must leave a row distinct from
/// the one it replaces.
fn random_token_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::generate_secret;
    use std::time::Duration;

    fn codec_with_secret(secret: &str) -> TokenCodec {
        let config = AuthConfig::builder()
            .secret(secret)
            .access_token_ttl(Duration::from_secs(15 * 60))
            .refresh_token_ttl(Duration::from_secs(14 * 24 * 60 * 60))
            .build();
        TokenCodec::new(&config)
    }

    fn codec() -> TokenCodec {
        codec_with_secret("unit-test-signing-key-with-plenty-of-length-0123456789")
    }

    fn user() -> User {
        User {
            id: 7,
            email: "a@x.com".to_string(),
            password_hash: "digest".to_string(),
            nickname: "abc".to_string(),
            profile_image_url: None,
            onboarding_completed: false,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let codec = codec();
        let token = codec.issue_access(&user());

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.subject, 7);
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
        assert_eq!(claims.nickname.as_deref(), Some("abc"));
        assert_eq!(claims.onboarding_completed, Some(false));
        assert_eq!(claims.expires_at - claims.issued_at, 15 * 60);
    }

    #[test]
    fn test_refresh_token_carries_no_pii() {
        let codec = codec();
        let token = codec.issue_refresh(&user());

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.subject, 7);
        assert_eq!(claims.email, None);
        assert_eq!(claims.nickname, None);
        assert_eq!(claims.onboarding_completed, None);

        // Belt and braces: the raw claims segment must not mention the email.
        let claims_b64 = token.split('.').nth(1).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(claims_b64).unwrap();
        assert!(!String::from_utf8(raw).unwrap().contains("a@x.com"));
    }

    #[test]
    fn test_wire_form_is_three_segments() {
        let token = codec().issue_access(&user());
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_cross_signature_rejected() {
        let token = codec_with_secret(&generate_secret(64)).issue_access(&user());
        let other = codec_with_secret(&generate_secret(64));

        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
        assert!(!other.is_valid(&token));
    }

    #[test]
    fn test_expired_claim_rejected() {
        let codec = codec();
        let iat = Utc::now().timestamp() - 120;
        let token = codec.encode(&serde_json::json!({
            "sub": "7",
            "iat": iat,
            "exp": iat + 60, // expired one minute ago
        }));

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec();

        for bad in [
            "",
            "onesegment",
            "two.segments",
            "a.b.c.d",
            "!!!.???.***",
        ] {
            assert_eq!(codec.verify(bad), Err(TokenError::Malformed), "input: {:?}", bad);
        }

        // Valid structure but claims are not JSON
        let junk_claims = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode("not json"),
            URL_SAFE_NO_PAD.encode("sig"),
        );
        assert_eq!(codec.verify(&junk_claims), Err(TokenError::Malformed));
    }

    #[test]
    fn test_non_numeric_subject_is_malformed() {
        let codec = codec();
        let iat = Utc::now().timestamp();
        let token = codec.encode(&serde_json::json!({
            "sub": "not-a-number",
            "iat": iat,
            "exp": iat + 60,
        }));
        assert_eq!(codec.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tokens_minted_same_second_are_distinct() {
        // Back-to-back issuance lands in the same second; the jti claim
        // must still make every token, and every fingerprint, unique.
        let codec = codec();
        let user = user();

        let r1 = codec.issue_refresh(&user);
        let r2 = codec.issue_refresh(&user);
        assert_ne!(r1, r2);
        assert_ne!(codec.fingerprint(&r1), codec.fingerprint(&r2));

        let a1 = codec.issue_access(&user);
        let a2 = codec.issue_access(&user);
        assert_ne!(a1, a2);
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let codec = codec();
        let a = codec.issue_refresh(&user());

        let fp1 = codec.fingerprint(&a);
        let fp2 = codec.fingerprint(&a);
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), 64); // SHA-256 hex
        assert!(fp1.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(fp1, codec.fingerprint("different-token"));
    }

    #[test]
    fn test_subject_and_expiry_accessors() {
        let codec = codec();
        let token = codec.issue_refresh(&user());

        assert_eq!(codec.subject_of(&token), Some(7));
        let exp = codec.expires_at(&token).unwrap();
        assert!(exp > Utc::now());

        assert_eq!(codec.subject_of("garbage"), None);
        assert_eq!(codec.expires_at("garbage"), None);
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(TokenCodec::strip_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(TokenCodec::strip_bearer("bearer abc"), None);
        assert_eq!(TokenCodec::strip_bearer("Basic dXNlcg=="), None);
        assert_eq!(TokenCodec::strip_bearer(""), None);
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let codec = codec();
        let token = codec.issue_access(&user());
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "sub": "999",
                "iat": Utc::now().timestamp(),
                "exp": Utc::now().timestamp() + 3600,
            })
            .to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::BadSignature));
    }
}
