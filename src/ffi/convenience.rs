//! One-call exports for callers that do not manage buffers
//!
//! The constructors use the 1024/512 real-time preset. The process calls
//! copy the caller's samples into temporary buffers owned by the façade, so
//! nothing outlives the call.

use std::ffi::c_char;
use std::{ptr, slice};

use super::panic_guard::{clear_last_error, guard};
use super::{method_name_from_c, registry};
use crate::analysis::{AnalysisParams, Method, OnsetDetector, TempoTracker};
use crate::config::engine_config;
use crate::facade;

/// Tempo tracker with the default method and real-time preset
#[no_mangle]
pub extern "C" fn wrapper_create_tempo_tracker(samplerate: u32) -> *mut TempoTracker {
    guard("wrapper_create_tempo_tracker", ptr::null_mut(), || {
        let params = AnalysisParams::realtime(Method::Default, samplerate);
        let tracker = TempoTracker::with_config(params, &engine_config().tempo)?;
        Ok(registry::register(tracker))
    })
}

/// Onset detector with the real-time preset; a null or empty `method`
/// selects the default detection function
///
/// # Safety
/// `method` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn wrapper_create_onset_detector(
    method: *const c_char,
    samplerate: u32,
) -> *mut OnsetDetector {
    guard("wrapper_create_onset_detector", ptr::null_mut(), || {
        let method = Method::parse_or_default(method_name_from_c(method)?)?;
        let params = AnalysisParams::realtime(method, samplerate);
        let detector = OnsetDetector::with_config(params, &engine_config().onset)?;
        Ok(registry::register(detector))
    })
}

/// Feed `num_samples` samples and report whether a beat occurred (1) or not (0)
///
/// The current BPM is written to `out_bpm` when it is non-null. A null
/// tracker, null samples or zero count is a no-op returning 0.
///
/// # Safety
/// `samples` must point to `num_samples` readable floats and `out_bpm` must
/// be null or writable. No other call may be using `tempo` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_process_tempo(
    tempo: *mut TempoTracker,
    samples: *const f32,
    num_samples: u32,
    out_bpm: *mut f32,
) -> i32 {
    if tempo.is_null() || samples.is_null() || num_samples == 0 {
        clear_last_error();
        return 0;
    }

    guard("wrapper_process_tempo", 0, || {
        let tracker = registry::get_mut(tempo)?;
        let samples = slice::from_raw_parts(samples, num_samples as usize);
        let step = facade::process_tempo(tracker, samples)?;
        if !out_bpm.is_null() {
            *out_bpm = step.bpm;
        }
        Ok(i32::from(step.beat))
    })
}

/// Feed `num_samples` samples and report whether an onset occurred (1) or not (0)
///
/// A null detector, null samples or zero count is a no-op returning 0.
///
/// # Safety
/// `samples` must point to `num_samples` readable floats. No other call may
/// be using `onset` concurrently.
#[no_mangle]
pub unsafe extern "C" fn wrapper_process_onset(
    onset: *mut OnsetDetector,
    samples: *const f32,
    num_samples: u32,
) -> i32 {
    if onset.is_null() || samples.is_null() || num_samples == 0 {
        clear_last_error();
        return 0;
    }

    guard("wrapper_process_onset", 0, || {
        let detector = registry::get_mut(onset)?;
        let samples = slice::from_raw_parts(samples, num_samples as usize);
        Ok(i32::from(facade::process_onset(detector, samples)?))
    })
}
