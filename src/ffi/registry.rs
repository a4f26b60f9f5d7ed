//! Live-handle registry
//!
//! Every handle handed across the boundary is a `Box::into_raw` pointer that
//! is recorded here together with its kind. Lookups go through the registry
//! before any dereference, which turns double destroy, use after destroy and
//! passing the wrong kind of handle into typed errors.
//!
//! The registry cannot tell a stale handle from a new object that happens to
//! be allocated at the same address.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use crate::analysis::{OnsetDetector, TempoTracker};
use crate::buffer::SampleBuffer;
use crate::error::{WrapperError, WrapperResult};

/// Object type behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Buffer,
    Tempo,
    Onset,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandleKind::Buffer => "buffer",
            HandleKind::Tempo => "tempo",
            HandleKind::Onset => "onset",
        })
    }
}

/// Types that can be exported as handles
pub trait Handle {
    const KIND: HandleKind;
}

impl Handle for SampleBuffer {
    const KIND: HandleKind = HandleKind::Buffer;
}

impl Handle for TempoTracker {
    const KIND: HandleKind = HandleKind::Tempo;
}

impl Handle for OnsetDetector {
    const KIND: HandleKind = HandleKind::Onset;
}

static LIVE: Lazy<Mutex<HashMap<usize, HandleKind>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn live() -> MutexGuard<'static, HashMap<usize, HandleKind>> {
    // The map stays consistent even if a holder panicked
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Box `value` and record the resulting handle
pub fn register<T: Handle>(value: T) -> *mut T {
    let ptr = Box::into_raw(Box::new(value));
    live().insert(ptr as usize, T::KIND);
    ptr
}

/// Confirm `ptr` is a live handle of kind `T::KIND`
pub fn check<T: Handle>(ptr: *const T) -> WrapperResult<()> {
    if ptr.is_null() {
        return Err(WrapperError::NullHandle { kind: T::KIND });
    }
    expect_kind::<T>(&live(), ptr as usize)
}

fn expect_kind<T: Handle>(live: &HashMap<usize, HandleKind>, key: usize) -> WrapperResult<()> {
    match live.get(&key) {
        None => Err(WrapperError::UnknownHandle { kind: T::KIND }),
        Some(&found) if found != T::KIND => Err(WrapperError::HandleKindMismatch {
            expected: T::KIND,
            found,
        }),
        Some(_) => Ok(()),
    }
}

/// Borrow the object behind a live handle
///
/// # Safety
/// No other reference to the same handle may be alive for `'a`; callers
/// serialise access to a handle, as the exported API requires.
pub unsafe fn get<'a, T: Handle>(ptr: *const T) -> WrapperResult<&'a T> {
    check(ptr)?;
    Ok(&*ptr)
}

/// Mutably borrow the object behind a live handle
///
/// # Safety
/// Same contract as [`get`].
pub unsafe fn get_mut<'a, T: Handle>(ptr: *mut T) -> WrapperResult<&'a mut T> {
    check(ptr as *const T)?;
    Ok(&mut *ptr)
}

/// Unregister a handle and drop the object behind it
///
/// The kind check and the removal happen under one lock, so of two racing
/// releases of the same handle exactly one frees it.
pub fn release<T: Handle>(ptr: *mut T) -> WrapperResult<()> {
    if ptr.is_null() {
        return Err(WrapperError::NullHandle { kind: T::KIND });
    }
    {
        let mut live = live();
        expect_kind::<T>(&live, ptr as usize)?;
        live.remove(&(ptr as usize));
    }

    // SAFETY: the pointer came from `register` and this call is the one that
    // took it out of the registry, so no other release will see it.
    drop(unsafe { Box::from_raw(ptr) });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_check_release() {
        let ptr = register(SampleBuffer::new(8).unwrap());
        assert!(check(ptr as *const SampleBuffer).is_ok());

        release(ptr).unwrap();
        assert_eq!(
            check(ptr as *const SampleBuffer),
            Err(WrapperError::UnknownHandle {
                kind: HandleKind::Buffer
            })
        );
        assert!(release(ptr).is_err(), "double release must be rejected");
    }

    #[test]
    fn test_null_is_rejected() {
        assert_eq!(
            check(std::ptr::null::<TempoTracker>()),
            Err(WrapperError::NullHandle {
                kind: HandleKind::Tempo
            })
        );
    }

    #[test]
    fn test_kind_confusion_is_rejected() {
        let ptr = register(SampleBuffer::new(4).unwrap());
        let as_onset = ptr as *const OnsetDetector;

        assert_eq!(
            check(as_onset),
            Err(WrapperError::HandleKindMismatch {
                expected: HandleKind::Onset,
                found: HandleKind::Buffer
            })
        );
        release(ptr).unwrap();
    }

    #[test]
    fn test_racing_releases_free_once() {
        for _ in 0..50 {
            let key = register(SampleBuffer::new(16).unwrap()) as usize;
            let barrier = std::sync::Arc::new(std::sync::Barrier::new(4));

            let freed = (0..4)
                .map(|_| {
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        release(key as *mut SampleBuffer).is_ok()
                    })
                })
                .collect::<Vec<_>>()
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .filter(|&freed| freed)
                .count();

            assert_eq!(freed, 1);
        }
    }
}
