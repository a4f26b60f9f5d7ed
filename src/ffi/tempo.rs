//! Tempo tracker exports

use std::ffi::c_char;
use std::ptr;

use super::panic_guard::{guard, status};
use super::{method_from_c, registry};
use crate::analysis::{AnalysisParams, TempoTracker};
use crate::buffer::SampleBuffer;
use crate::config::engine_config;
use crate::error::WrapperError;

/// Read a value from a live tracker, `R::default()` on an invalid handle
unsafe fn query<R: Default>(
    function: &'static str,
    handle: *const TempoTracker,
    read: impl FnOnce(&TempoTracker) -> R,
) -> R {
    guard(function, R::default(), || Ok(read(registry::get(handle)?)))
}

/// Saturate a sample position into the u32 the ABI carries
pub(super) fn position_u32(position: u64) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// Create a tempo tracker
///
/// Returns null for an unknown method, a null method string or unusable
/// geometry (`hop_size > buf_size`, zero sizes, zero sample rate).
///
/// # Safety
/// `method` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn wrapper_new_aubio_tempo(
    method: *const c_char,
    buf_size: u32,
    hop_size: u32,
    samplerate: u32,
) -> *mut TempoTracker {
    guard("wrapper_new_aubio_tempo", ptr::null_mut(), || {
        let params = AnalysisParams {
            method: method_from_c(method)?,
            window_size: buf_size as usize,
            hop_size: hop_size as usize,
            sample_rate: samplerate,
        };
        let tracker = TempoTracker::with_config(params, &engine_config().tempo)?;
        Ok(registry::register(tracker))
    })
}

/// Process one hop from `input`, writing the beat value into `output[0]`
///
/// `input` and `output` must be distinct buffers. On failure `output` is
/// left untouched.
///
/// # Safety
/// No other call may be using any of the three handles concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_do(
    o: *mut TempoTracker,
    input: *const SampleBuffer,
    output: *mut SampleBuffer,
) {
    guard("wrapper_aubio_tempo_do", (), || {
        let tracker = registry::get_mut(o)?;
        let input_buf = registry::get(input)?;
        registry::check(output as *const SampleBuffer)?;
        if ptr::eq(input, output) {
            return Err(WrapperError::AliasedBuffers);
        }
        let output = registry::get_mut(output)?;

        tracker.process(input_buf.as_slice(), output.as_mut_slice())?;
        Ok(())
    })
}

/// Sample position of the last detected beat
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_last(o: *const TempoTracker) -> u32 {
    query("wrapper_aubio_tempo_get_last", o, |t| position_u32(t.last()))
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_last_s(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_last_s", o, TempoTracker::last_s)
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_last_ms(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_last_ms", o, TempoTracker::last_ms)
}

/// Set the silence gate in dB; returns 0 on success
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_set_silence(o: *mut TempoTracker, silence: f32) -> u32 {
    status("wrapper_aubio_tempo_set_silence", || {
        registry::get_mut(o)?.set_silence(silence)
    })
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_silence(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_silence", o, TempoTracker::silence)
}

/// Set the peak-picking threshold; returns 0 on success
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_set_threshold(o: *mut TempoTracker, threshold: f32) -> u32 {
    status("wrapper_aubio_tempo_set_threshold", || {
        registry::get_mut(o)?.set_threshold(threshold)
    })
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_threshold(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_threshold", o, TempoTracker::threshold)
}

/// Beat period in samples
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_period(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_period", o, TempoTracker::period)
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_period_s(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_period_s", o, TempoTracker::period_s)
}

/// Current tempo estimate, 0.0 before the first estimate
///
/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_bpm(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_bpm", o, TempoTracker::bpm)
}

/// # Safety
/// No other call may be mutating `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_aubio_tempo_get_confidence(o: *const TempoTracker) -> f32 {
    query("wrapper_aubio_tempo_get_confidence", o, TempoTracker::confidence)
}

/// Destroy a tracker. Null, stale and already-destroyed handles are ignored.
///
/// # Safety
/// No other call may be using `o` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_del_aubio_tempo(o: *mut TempoTracker) {
    guard("wrapper_del_aubio_tempo", (), || registry::release(o))
}
