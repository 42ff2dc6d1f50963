//! Signup Input Validation
//!
//! Field-level validation for the values accepted at signup. Validation is
//! the first step of every mutating operation: length limits bound work done
//! on attacker-controlled input, and format checks keep garbage out of the
//! directory before any hashing or storage happens.
//!
//! # Usage
//!
//! ```
//! use portcullis::validation::{validate_email, validate_length};
//!
//! assert!(validate_email("a@x.com").is_ok());
//! assert!(validate_length("nickname", 2, 20, "nickname").is_ok());
//! assert!(validate_email("not-an-email").is_err());
//! ```

use std::fmt;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation error with field context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,
    /// Human-readable message
    pub message: String,
}

/// Machine-readable validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Value is shorter than the allowed minimum
    TooShort,
    /// Value is longer than the allowed maximum
    TooLong,
    /// Value does not match the expected format
    InvalidFormat,
}

impl ValidationError {
    /// Create a validation error for a specific field.
    pub fn for_field(
        field: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Validators
// ============================================================================

/// Validate a value's character length against inclusive bounds.
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field: &str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();

    if len < min {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooShort,
            format!("must be at least {} characters (got {})", min, len),
        ));
    }

    if len > max {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooLong,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }

    Ok(())
}

/// Validate a value's UTF-8 byte length against an inclusive maximum.
///
/// Character counts are the right bound for display fields, but hashing
/// inputs are bounded in bytes (bcrypt truncates past 72 bytes), and a
/// multibyte string can be several times longer in bytes than in characters.
pub fn validate_max_bytes(value: &str, max: usize, field: &str) -> Result<(), ValidationError> {
    let len = value.len();
    if len > max {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooLong,
            format!("must be at most {} bytes (got {})", max, len),
        ));
    }
    Ok(())
}

/// Validate basic email shape: one `@`, non-empty local part, and a domain
/// containing a dot.
///
/// This is a structural sanity check, not RFC 5322 enforcement. Delivery is
/// the only real proof of an address.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let err = || {
        ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidFormat,
            "must be a valid email address",
        )
    };

    if value.is_empty() || value.len() > 254 || value.contains(char::is_whitespace) {
        return Err(err());
    }

    let (local, domain) = value.split_once('@').ok_or_else(err)?;

    if local.is_empty() || domain.is_empty() {
        return Err(err());
    }

    // Domain needs at least one interior dot
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(err());
    }

    // Reject a second '@'
    if domain.contains('@') {
        return Err(err());
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
