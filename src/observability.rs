//! Security Event Logging
//!
//! Structured audit logging for the authentication engine. Application code
//! emits events through the [`security_event!`] macro and standard `tracing`
//! macros; which subscriber consumes them is configured once at startup.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::observability::SecurityEvent;
//! use portcullis::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationSuccess,
//!     user_id = %user.id,
//!     "User authenticated"
//! );
//! ```

use std::fmt;

// ============================================================================
// Security Events
// ============================================================================

/// Security event categories for audit logging.
///
/// Each authentication-relevant state change maps to exactly one event so
/// audit trails can be filtered by name, category, or severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Successful credential authentication
    AuthenticationSuccess,
    /// Failed credential authentication attempt
    AuthenticationFailure,
    /// New user registered
    UserRegistered,
    /// Refresh session persisted
    SessionCreated,
    /// Refresh session replaced during token rotation
    SessionRotated,
    /// Refresh session removed (logout, revocation, or expiry)
    SessionDestroyed,
    /// Refresh attempt rejected (replayed, forged, or expired token)
    RefreshRejected,
    /// User logged out
    Logout,
}

impl SecurityEvent {
    /// Event category for filtering/grouping.
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess
            | Self::AuthenticationFailure
            | Self::Logout => "authentication",

            Self::SessionCreated
            | Self::SessionRotated
            | Self::SessionDestroyed
            | Self::RefreshRejected => "session",

            Self::UserRegistered => "user_management",
        }
    }

    /// Severity level for the event.
    pub fn severity(&self) -> Severity {
        match self {
            Self::AuthenticationFailure | Self::RefreshRejected => Severity::High,

            Self::AuthenticationSuccess | Self::UserRegistered => Severity::Medium,

            Self::SessionCreated
            | Self::SessionRotated
            | Self::SessionDestroyed
            | Self::Logout => Severity::Low,
        }
    }

    /// Event name as a stable string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::UserRegistered => "user_registered",
            Self::SessionCreated => "session_created",
            Self::SessionRotated => "session_rotated",
            Self::SessionDestroyed => "session_destroyed",
            Self::RefreshRejected => "refresh_rejected",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
    /// Immediate attention required
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Log a security event with structured fields.
///
/// Automatically attaches `security_event`, `category`, and `severity`
/// fields and routes to the `tracing` level matching the event severity.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let severity = event.severity();
        let category = event.category();
        let event_name = event.name();

        match severity {
            $crate::observability::Severity::Critical => {
                ::tracing::error!(
                    security_event = event_name,
                    category = category,
                    severity = %severity,
                    $($field)*
                );
            }
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = %severity,
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = %severity,
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = %severity,
                    $($field)*
                );
            }
        }
    }};
}

// ============================================================================
// Subscriber Initialization
// ============================================================================

/// Install a formatting `tracing` subscriber filtered by `RUST_LOG`.
///
/// Call once at process start. Safe to call again (later calls are no-ops),
/// so tests and embedding applications can both invoke it.
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================
