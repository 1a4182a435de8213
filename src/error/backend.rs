// Backend error type and code constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Backend error code constants
///
/// Single source of truth for the codes carried by [`BackendError`]. Native
/// backends may use their own codes; these are the ones produced by the
/// crate's own backends and by the completion channel.
///
/// Error code range: 3001-3007
pub struct BackendErrorCodes {}

impl BackendErrorCodes {
    /// Generic failure reported by a platform backend
    pub const BACKEND_FAILURE: i32 = 3001;

    /// Operation is not available on the active platform
    pub const NOT_SUPPORTED: i32 = 3002;

    /// Operation requires a prepared session
    pub const NOT_PREPARED: i32 = 3003;

    /// Transition is not valid from the current playback state
    pub const INVALID_STATE: i32 = 3004;

    /// Argument rejected by the backend
    pub const INVALID_ARGUMENT: i32 = 3005;

    /// Backend dropped a completion without resolving it
    pub const COMPLETION_DROPPED: i32 = 3006;

    /// I/O failure while accessing a track or output location
    pub const IO: i32 = 3007;
}

/// Log a backend error with structured context
///
/// Logs the numeric code, the component and the message. Used by backends
/// when they reject an operation; the controller forwards errors untouched
/// and does not call this.
pub fn log_backend_error(err: &BackendError, context: &str) {
    error!(
        "Backend error in {}: code={}, component=PreviewBackend, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Opaque error value reported by a preview backend.
///
/// The controller never inspects or wraps it: whatever a backend resolves a
/// completion with is exactly what the caller receives.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BackendError {
    code: i32,
    message: String,
}

impl BackendError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Failure with the generic backend code.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(BackendErrorCodes::BACKEND_FAILURE, message)
    }

    pub fn not_supported(operation: &str) -> Self {
        Self::new(
            BackendErrorCodes::NOT_SUPPORTED,
            format!("{} is not supported on this platform", operation),
        )
    }

    pub fn not_prepared(operation: &str) -> Self {
        Self::new(
            BackendErrorCodes::NOT_PREPARED,
            format!("Prepare should be called before {}", operation),
        )
    }

    pub fn invalid_state(operation: &str, state: impl fmt::Debug) -> Self {
        Self::new(
            BackendErrorCodes::INVALID_STATE,
            format!("{} is not valid while {:?}", operation, state),
        )
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(BackendErrorCodes::INVALID_ARGUMENT, reason)
    }

    pub fn completion_dropped(operation: &str) -> Self {
        Self::new(
            BackendErrorCodes::COMPLETION_DROPPED,
            format!("{} completed without a result", operation),
        )
    }
}

impl ErrorCode for BackendError {
    fn code(&self) -> i32 {
        self.code
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendError (code {}): {}", self.code, self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::new(BackendErrorCodes::IO, err.to_string())
    }
}
