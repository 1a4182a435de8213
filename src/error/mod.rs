// Error types for the preview audio player
//
// A single opaque error type flows from backends to callers. Codes are
// structured so they can cross an FFI boundary unchanged.

mod backend;

pub use backend::{log_backend_error, BackendError, BackendErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
