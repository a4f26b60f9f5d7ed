// Wrapper error types and constants

use crate::error::ErrorCode;
use crate::ffi::HandleKind;
use log::warn;
use std::fmt;

/// Wrapper error code constants exposed to managed callers
///
/// These values are what `wrapper_last_error_code` returns and what the
/// configuration setters hand back as their non-zero status.
///
/// Error code range: 2001-2010
pub struct WrapperErrorCodes {}

impl WrapperErrorCodes {
    /// A null handle was passed where a live one is required
    pub const NULL_HANDLE: i32 = 2001;

    /// Handle was never created, or was already destroyed
    pub const UNKNOWN_HANDLE: i32 = 2002;

    /// Handle belongs to a different object type
    pub const HANDLE_KIND_MISMATCH: i32 = 2003;

    /// Sample index outside the buffer
    pub const INDEX_OUT_OF_BOUNDS: i32 = 2004;

    /// Method identifier not recognised
    pub const UNKNOWN_METHOD: i32 = 2005;

    /// Parameter outside its accepted range
    pub const INVALID_PARAMETER: i32 = 2006;

    /// Sample storage could not be allocated
    pub const ALLOCATION_FAILED: i32 = 2007;

    /// Input buffer shorter than the configured hop size
    pub const HOP_SIZE_MISMATCH: i32 = 2008;

    /// Input and output refer to the same buffer
    pub const ALIASED_BUFFERS: i32 = 2009;

    /// A panic was caught at the FFI boundary
    pub const PANICKED: i32 = 2010;
}

/// Log a wrapper error with structured context
///
/// Used at the FFI edge, where the typed error is about to be collapsed
/// into a neutral return value and would otherwise be lost.
pub fn log_wrapper_error(err: &WrapperError, context: &str) {
    warn!(
        "Wrapper error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Wrapper-related errors
///
/// Misuse that the historical native library left undefined (double destroy,
/// stale handles, out-of-range indexing) is reported through these variants.
///
/// Error code range: 2001-2010
#[derive(Debug, Clone, PartialEq)]
pub enum WrapperError {
    /// Null handle where a live one is required
    NullHandle { kind: HandleKind },

    /// Handle not present in the registry
    UnknownHandle { kind: HandleKind },

    /// Handle registered under a different kind
    HandleKindMismatch {
        expected: HandleKind,
        found: HandleKind,
    },

    /// Index outside `0..length`
    IndexOutOfBounds { index: usize, length: usize },

    /// Unrecognised analysis method name
    UnknownMethod { name: String },

    /// Parameter rejected at construction or by a setter
    InvalidParameter { parameter: String, reason: String },

    /// Allocation of sample storage failed
    AllocationFailed { samples: usize },

    /// Input buffer shorter than one hop
    HopSizeMismatch { expected: usize, got: usize },

    /// Input and output buffers are the same object
    AliasedBuffers,

    /// A panic was caught before it could cross the boundary
    Panicked { function: String },
}

impl WrapperError {
    pub fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        WrapperError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for WrapperError {
    fn code(&self) -> i32 {
        match self {
            WrapperError::NullHandle { .. } => WrapperErrorCodes::NULL_HANDLE,
            WrapperError::UnknownHandle { .. } => WrapperErrorCodes::UNKNOWN_HANDLE,
            WrapperError::HandleKindMismatch { .. } => WrapperErrorCodes::HANDLE_KIND_MISMATCH,
            WrapperError::IndexOutOfBounds { .. } => WrapperErrorCodes::INDEX_OUT_OF_BOUNDS,
            WrapperError::UnknownMethod { .. } => WrapperErrorCodes::UNKNOWN_METHOD,
            WrapperError::InvalidParameter { .. } => WrapperErrorCodes::INVALID_PARAMETER,
            WrapperError::AllocationFailed { .. } => WrapperErrorCodes::ALLOCATION_FAILED,
            WrapperError::HopSizeMismatch { .. } => WrapperErrorCodes::HOP_SIZE_MISMATCH,
            WrapperError::AliasedBuffers => WrapperErrorCodes::ALIASED_BUFFERS,
            WrapperError::Panicked { .. } => WrapperErrorCodes::PANICKED,
        }
    }

    fn message(&self) -> String {
        match self {
            WrapperError::NullHandle { kind } => format!("Null {} handle", kind),
            WrapperError::UnknownHandle { kind } => {
                format!("Unknown {} handle (never created or already destroyed)", kind)
            }
            WrapperError::HandleKindMismatch { expected, found } => {
                format!("Expected a {} handle, got a {} handle", expected, found)
            }
            WrapperError::IndexOutOfBounds { index, length } => {
                format!("Index {} out of bounds for buffer of length {}", index, length)
            }
            WrapperError::UnknownMethod { name } => {
                format!("Unknown analysis method '{}'", name)
            }
            WrapperError::InvalidParameter { parameter, reason } => {
                format!("Invalid {}: {}", parameter, reason)
            }
            WrapperError::AllocationFailed { samples } => {
                format!("Failed to allocate buffer of {} samples", samples)
            }
            WrapperError::HopSizeMismatch { expected, got } => {
                format!("Input holds {} samples, hop size is {}", got, expected)
            }
            WrapperError::AliasedBuffers => {
                "Input and output must be distinct buffers".to_string()
            }
            WrapperError::Panicked { function } => format!("Panic caught in {}", function),
        }
    }
}

impl fmt::Display for WrapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WrapperError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for WrapperError {}
