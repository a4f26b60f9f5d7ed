//! Onset detector exports

use std::ffi::c_char;
use std::ptr;

use super::panic_guard::{guard, status};
use super::tempo::position_u32;
use super::{method_from_c, registry};
use crate::analysis::{AnalysisParams, OnsetDetector};
use crate::buffer::SampleBuffer;
use crate::config::engine_config;
use crate::error::WrapperError;

unsafe fn query<R: Default>(
    function: &'static str,
    handle: *const OnsetDetector,
    read: impl FnOnce(&OnsetDetector) -> R,
) -> R {
    guard(function, R::default(), || Ok(read(registry::get(handle)?)))
}

/// Create an onset detector; null on an unknown method or bad geometry
///
/// # Safety
/// `method` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn wrapper_new_aubio_onset(
    method: *const c_char,
    buf_size: u32,
    hop_size: u32,
    samplerate: u32,
) -> *mut OnsetDetector {
    guard("wrapper_new_aubio_onset", ptr::null_mut(), || {
        let params = AnalysisParams {
            method: method_from_c(method)?,
            window_size: buf_size as usize,
            hop_size: hop_size as usize,
            sample_rate: samplerate,
        };
        let detector = OnsetDetector::with_config(params, &engine_config().onset)?;
        Ok(registry::register(detector))
    })
}

/// Process one hop; `output[0]` becomes non-zero when an onset is detected
///
/// # Safety
/// No other call may be using any of the three handles concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_do(
    o: *mut OnsetDetector,
    input: *const SampleBuffer,
    output: *mut SampleBuffer,
) {
    guard("wrapper_aubio_onset_do", (), || {
        let detector = registry::get_mut(o)?;
        let input_buf = registry::get(input)?;
        registry::check(output as *const SampleBuffer)?;
        if ptr::eq(input, output) {
            return Err(WrapperError::AliasedBuffers);
        }
        let output = registry::get_mut(output)?;

        detector.process(input_buf.as_slice(), output.as_mut_slice())?;
        Ok(())
    })
}

/// Sample position of the last onset
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_last(o: *const OnsetDetector) -> u32 {
    query("wrapper_aubio_onset_get_last", o, |d| position_u32(d.last()))
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_last_s(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_last_s", o, OnsetDetector::last_s)
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_last_ms(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_last_ms", o, OnsetDetector::last_ms)
}

/// Set the silence gate in dB; returns 0 on success
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_set_silence(o: *mut OnsetDetector, silence: f32) -> u32 {
    status("wrapper_aubio_onset_set_silence", || {
        registry::get_mut(o)?.set_silence(silence)
    })
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_silence(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_silence", o, OnsetDetector::silence)
}

/// Raw descriptor value of the last processed hop
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_descriptor(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_descriptor", o, OnsetDetector::descriptor)
}

/// Descriptor value after adaptive thresholding
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_thresholded_descriptor(
    o: *const OnsetDetector,
) -> f32 {
    query(
        "wrapper_aubio_onset_get_thresholded_descriptor",
        o,
        OnsetDetector::thresholded_descriptor,
    )
}

/// Set the peak-picking threshold; returns 0 on success
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_set_threshold(o: *mut OnsetDetector, threshold: f32) -> u32 {
    status("wrapper_aubio_onset_set_threshold", || {
        registry::get_mut(o)?.set_threshold(threshold)
    })
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_threshold(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_threshold", o, OnsetDetector::threshold)
}

/// Set the minimum inter-onset interval in ms; returns 0 on success
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_set_minioi_ms(o: *mut OnsetDetector, minioi: f32) -> u32 {
    status("wrapper_aubio_onset_set_minioi_ms", || {
        registry::get_mut(o)?.set_minioi_ms(minioi)
    })
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_get_minioi_ms(o: *const OnsetDetector) -> f32 {
    query("wrapper_aubio_onset_get_minioi_ms", o, OnsetDetector::minioi_ms)
}

/// Forget the last onset and restart the sample clock; configuration is kept
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_onset_reset(o: *mut OnsetDetector) {
    guard("wrapper_aubio_onset_reset", (), || {
        registry::get_mut(o)?.reset();
        Ok(())
    })
}

/// Destroy a detector. Null, stale and already-destroyed handles are ignored.
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_del_aubio_onset(o: *mut OnsetDetector) {
    guard("wrapper_del_aubio_onset", (), || registry::release(o))
}
