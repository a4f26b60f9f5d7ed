// Error types for the aubio wrapper
//
// This module defines the typed failures raised by buffer, tempo and onset
// operations, with stable numeric codes the FFI layer hands back to callers.

mod wrapper;

pub use wrapper::{log_wrapper_error, WrapperError, WrapperErrorCodes};

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

/// Result alias used throughout the crate
pub type WrapperResult<T> = Result<T, WrapperError>;
