//! Credential Hashing
//!
//! Salted, adaptive-cost password hashing built on bcrypt. The cost factor
//! is configurable and defaults to 12, which keeps a single verification in
//! the hundreds-of-milliseconds range on current hardware.
//!
//! # Design Philosophy
//!
//! Verification is infallible from the caller's perspective: a wrong
//! password and a malformed stored digest both come back as `false`. The
//! only fallible operation is hashing itself (an invalid cost factor), and
//! that surfaces at signup, never at login.
//!
//! # Usage
//!
//! ```
//! use portcullis::password::PasswordHasher;
//!
//! let hasher = PasswordHasher::new(4); // low cost for doc-test speed
//! let digest = hasher.hash("correct horse battery staple").unwrap();
//!
//! assert!(hasher.verify("correct horse battery staple", &digest));
//! assert!(!hasher.verify("tr0ub4dor&3", &digest));
//! assert!(!hasher.verify("anything", "not-a-bcrypt-digest"));
//! ```

// ============================================================================
// Password Hasher
// ============================================================================

/// One-way credential hasher with a fixed cost factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

/// Error produced when a password cannot be hashed.
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(#[from] bcrypt::BcryptError);

impl Default for PasswordHasher {
    /// bcrypt cost 12.
    fn default() -> Self {
        Self { cost: 12 }
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit cost factor.
    ///
    /// bcrypt accepts costs 4 through 31; lower values are for tests only.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password into a salted bcrypt digest.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// Returns `false` for a mismatch and for a malformed digest; a broken
    /// stored value must read as a failed login, not a crash.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }

    /// The configured cost factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 is the bcrypt minimum; anything higher makes the suite crawl.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let h = hasher();
        let digest = h.hash("password1").unwrap();
        assert!(h.verify("password1", &digest));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let h = hasher();
        let digest = h.hash("password1").unwrap();
        assert!(!h.verify("password2", &digest));
    }

    #[test]
    fn test_hashes_are_salted() {
        let h = hasher();
        let a = h.hash("same-input").unwrap();
        let b = h.hash("same-input").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("same-input", &a));
        assert!(h.verify("same-input", &b));
    }

    #[test]
    fn test_malformed_digest_is_verification_failure() {
        let h = hasher();
        assert!(!h.verify("password1", ""));
        assert!(!h.verify("password1", "$2y$totally-broken"));
        assert!(!h.verify("password1", "plaintext-not-a-digest"));
    }

    #[test]
    fn test_default_cost_is_twelve() {
        assert_eq!(PasswordHasher::default().cost(), 12);
    }
}
