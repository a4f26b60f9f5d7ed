// FFI module - flat C ABI consumed by managed callers
//
// Symbol names match the historical `aubio_wrapper` native library so
// existing P/Invoke declarations bind unchanged. Every export:
//
//   - validates handles through the registry before touching them
//   - runs inside the panic guard, so no unwind reaches the caller
//   - collapses failures to a neutral value (null, 0, 0.0) and records the
//     error code for `wrapper_last_error_code`
//
// Handles are not internally synchronised. One handle must not be used from
// two threads at once; distinct handles are independent.

pub mod buffer;
pub mod convenience;
pub mod onset;
mod panic_guard;
pub mod registry;
pub mod tempo;

pub use registry::HandleKind;

use std::ffi::{c_char, CStr};

use crate::analysis::Method;
use crate::error::{WrapperError, WrapperResult};

/// Borrow a method identifier passed as a C string (`None` for null)
///
/// # Safety
/// `name` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn method_name_from_c<'a>(name: *const c_char) -> WrapperResult<Option<&'a str>> {
    if name.is_null() {
        return Ok(None);
    }
    let name = CStr::from_ptr(name);
    name.to_str()
        .map(Some)
        .map_err(|_| WrapperError::UnknownMethod {
            name: name.to_string_lossy().into_owned(),
        })
}

/// Parse a method identifier that must be present
///
/// # Safety
/// `name` must be null or point to a NUL-terminated string.
unsafe fn method_from_c(name: *const c_char) -> WrapperResult<Method> {
    match method_name_from_c(name)? {
        Some(name) => name.parse(),
        None => Err(WrapperError::invalid("method", "must not be null")),
    }
}

/// Error code of the most recent failed call on this thread (0 = none)
#[no_mangle]
pub extern "C" fn wrapper_last_error_code() -> i32 {
    panic_guard::last_error_code()
}

/// Install the tracing subscriber; returns 0 when installed, 1 when a
/// subscriber was already present
#[no_mangle]
pub extern "C" fn wrapper_init_logging() -> i32 {
    panic_guard::guard("wrapper_init_logging", 1, || {
        Ok(if crate::init_logging() { 0 } else { 1 })
    })
}

/// Library version as a static NUL-terminated string
#[no_mangle]
pub extern "C" fn wrapper_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
