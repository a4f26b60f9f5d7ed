//! Error and panic containment for exported functions
//!
//! Exported bodies return `WrapperResult`; the guard collapses that into the
//! function's neutral return value, records the error code for
//! `wrapper_last_error_code` and makes sure no panic unwinds into the
//! caller's runtime.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{log_wrapper_error, ErrorCode, WrapperError, WrapperResult};

thread_local! {
    static LAST_ERROR: Cell<i32> = const { Cell::new(0) };
}

/// Code of the last failure on this thread, 0 if the last call succeeded
pub fn last_error_code() -> i32 {
    LAST_ERROR.with(Cell::get)
}

fn record(code: i32) {
    LAST_ERROR.with(|last| last.set(code));
}

fn run<R>(function: &'static str, body: impl FnOnce() -> WrapperResult<R>) -> Result<R, i32> {
    let err = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => {
            record(0);
            return Ok(value);
        }
        Ok(Err(err)) => err,
        Err(_) => WrapperError::Panicked {
            function: function.to_string(),
        },
    };

    log_wrapper_error(&err, function);
    let code = err.code();
    record(code);
    Err(code)
}

/// Run `body`, returning `fallback` on error or panic
pub fn guard<R>(function: &'static str, fallback: R, body: impl FnOnce() -> WrapperResult<R>) -> R {
    run(function, body).unwrap_or(fallback)
}

/// Run a configuration body and map it to a status code (0 = success)
pub fn status(function: &'static str, body: impl FnOnce() -> WrapperResult<()>) -> u32 {
    match run(function, body) {
        Ok(()) => 0,
        Err(code) => code as u32,
    }
}

/// Mark a benign no-op (e.g. empty input to a convenience call) as success
pub fn clear_last_error() {
    record(0);
}
