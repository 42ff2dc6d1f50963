//! Signing Secret Validation and Generation
//!
//! The symmetric key that signs every token is the single highest-value
//! secret in the system, and it is loaded exactly once at process start.
//! This module validates that loaded key material is actually secret-shaped
//! (length, entropy, no dictionary filler) and can generate a suitable key
//! for development environments.
//!
//! # Usage
//!
//! ```
//! use portcullis::secret::{SecretPolicy, generate_secret};
//!
//! let policy = SecretPolicy::default();
//! assert!(policy.validate("hunter2").is_err());
//!
//! let secret = generate_secret(64);
//! assert!(policy.validate(&secret).is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Secret Errors
// ============================================================================

/// Error type for signing-secret validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretError {
    /// Secret is too short
    TooShort { actual: usize, minimum: usize },
    /// Secret contains a weak/common pattern
    WeakPattern { pattern: String },
    /// Secret has insufficient entropy
    LowEntropy { actual: f64, minimum: f64 },
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual, minimum } => {
                write!(
                    f,
                    "signing secret length ({} chars) is below minimum ({} chars)",
                    actual, minimum
                )
            }
            Self::WeakPattern { pattern } => {
                write!(f, "signing secret contains weak pattern: '{}'", pattern)
            }
            Self::LowEntropy { actual, minimum } => {
                write!(
                    f,
                    "signing secret entropy ({:.1} bits) is below minimum ({:.1} bits)",
                    actual, minimum
                )
            }
        }
    }
}

impl std::error::Error for SecretError {}

// ============================================================================
// Secret Policy
// ============================================================================

/// Policy for signing-secret validation.
///
/// The default requires 32 characters and 64 bits of Shannon entropy, which
/// any randomly generated key clears trivially while hand-typed placeholder
/// values do not.
#[derive(Debug, Clone)]
pub struct SecretPolicy {
    /// Minimum secret length in characters
    pub min_length: usize,
    /// Minimum Shannon entropy in bits
    pub min_entropy: f64,
    /// Whether to check for weak patterns
    pub check_weak_patterns: bool,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self {
            min_length: 32,
            min_entropy: 64.0,
            check_weak_patterns: true,
        }
    }
}

impl SecretPolicy {
    /// Stricter policy for production key material: 64 characters and
    /// 128 bits of entropy.
    pub fn strict() -> Self {
        Self {
            min_length: 64,
            min_entropy: 128.0,
            check_weak_patterns: true,
        }
    }

    /// Validate a secret against this policy.
    pub fn validate(&self, secret: &str) -> Result<(), SecretError> {
        if secret.len() < self.min_length {
            return Err(SecretError::TooShort {
                actual: secret.len(),
                minimum: self.min_length,
            });
        }

        if self.check_weak_patterns {
            if let Some(pattern) = find_weak_pattern(secret) {
                return Err(SecretError::WeakPattern {
                    pattern: pattern.to_string(),
                });
            }
        }

        let entropy = shannon_entropy(secret);
        if entropy < self.min_entropy {
            return Err(SecretError::LowEntropy {
                actual: entropy,
                minimum: self.min_entropy,
            });
        }

        Ok(())
    }
}

/// Check for common placeholder values embedded in the secret.
fn find_weak_pattern(secret: &str) -> Option<&'static str> {
    const WEAK_PATTERNS: &[&str] = &[
        "secret", "password", "admin", "123456", "qwerty", "default",
        "example", "sample", "changeme", "letmein", "welcome",
    ];

    let secret_lower = secret.to_lowercase();
    WEAK_PATTERNS
        .iter()
        .find(|p| secret_lower.contains(**p))
        .copied()
}

/// Total Shannon entropy of a string in bits (per-char entropy times length).
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut char_counts: HashMap<char, usize> = HashMap::new();
    let total = s.chars().count() as f64;

    for c in s.chars() {
        *char_counts.entry(c).or_insert(0) += 1;
    }

    let mut entropy = 0.0;
    for count in char_counts.values() {
        let probability = *count as f64 / total;
        entropy -= probability * probability.log2();
    }

    entropy * total
}

// ============================================================================
// Secret Generation
// ============================================================================

/// Generate a cryptographically secure random secret of the given length.
///
/// Intended for development and test environments; production key material
/// should come from a secret manager.
pub fn generate_secret(length: usize) -> String {
    use rand::Rng;

    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+-=";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
