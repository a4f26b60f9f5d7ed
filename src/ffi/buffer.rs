//! Sample buffer exports (`fvec` in the historical naming)

use std::ptr;

use super::panic_guard::guard;
use super::registry;
use crate::buffer::SampleBuffer;

/// Allocate a zero-filled buffer of `length` samples
///
/// Returns null when `length` is 0 or the allocation fails.
#[no_mangle]
pub extern "C" fn wrapper_new_fvec(length: u32) -> *mut SampleBuffer {
    guard("wrapper_new_fvec", ptr::null_mut(), || {
        let buffer = SampleBuffer::new(length as usize)?;
        Ok(registry::register(buffer))
    })
}

/// Destroy a buffer. Null, stale and already-destroyed handles are ignored.
///
/// # Safety
/// No other call may be using `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_del_fvec(handle: *mut SampleBuffer) {
    guard("wrapper_del_fvec", (), || registry::release(handle))
}

/// Read one sample; 0.0 when the handle or position is invalid
///
/// # Safety
/// No other call may be mutating `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_fvec_get_sample(handle: *const SampleBuffer, position: u32) -> f32 {
    guard("wrapper_fvec_get_sample", 0.0, || {
        registry::get(handle)?.get(position as usize)
    })
}

/// Write one sample; ignored when the handle or position is invalid
///
/// # Safety
/// No other call may be using `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_fvec_set_sample(handle: *mut SampleBuffer, data: f32, position: u32) {
    guard("wrapper_fvec_set_sample", (), || {
        registry::get_mut(handle)?.set(position as usize, data)
    })
}

/// Pointer to the contiguous sample storage, null for an invalid handle
///
/// The pointer is valid for `wrapper_fvec_get_length` samples until the
/// buffer is destroyed.
///
/// # Safety
/// No other call may be using `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_fvec_get_data(handle: *mut SampleBuffer) -> *mut f32 {
    guard("wrapper_fvec_get_data", ptr::null_mut(), || {
        Ok(registry::get_mut(handle)?.as_mut_ptr())
    })
}

/// Set every sample to 0.0
///
/// # Safety
/// No other call may be using `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_fvec_zeros(handle: *mut SampleBuffer) {
    guard("wrapper_fvec_zeros", (), || {
        registry::get_mut(handle)?.zero();
        Ok(())
    })
}

/// Buffer length in samples, 0 for an invalid handle
///
/// # Safety
/// No other call may be mutating `handle` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_fvec_get_length(handle: *const SampleBuffer) -> u32 {
    guard("wrapper_fvec_get_length", 0, || {
        // Lengths originate from a u32 so the conversion cannot truncate
        Ok(registry::get(handle)?.len() as u32)
    })
}
