// Analysis module - tempo tracking and onset detection
//
// The analysers are thin owners of aubio's `Tempo` and `Onset` objects. This
// layer validates geometry and tunables, slices each call down to one hop and
// maps aubio's failures onto `WrapperError`; every number the analysers
// report comes straight from aubio.
//
// Each analyser owns its aubio object outright; nothing is shared between
// instances, so distinct analysers can run on different threads.

pub mod method;
pub mod onset;
pub mod signals;
pub mod tempo;

pub use method::Method;
pub use onset::OnsetDetector;
pub use tempo::TempoTracker;

use crate::config::{REALTIME_HOP_SIZE, REALTIME_WINDOW_SIZE};
use crate::error::{WrapperError, WrapperResult};

/// Largest accepted analysis window, in samples
pub const MAX_WINDOW_SIZE: usize = 1 << 16;

/// Highest accepted sample rate, in Hz
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Construction parameters shared by tempo trackers and onset detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParams {
    pub method: Method,
    /// FFT window in samples
    pub window_size: usize,
    /// New samples per `process` call
    pub hop_size: usize,
    pub sample_rate: u32,
}

impl AnalysisParams {
    /// The 1024/512 preset, suited to real-time use
    pub fn realtime(method: Method, sample_rate: u32) -> Self {
        Self {
            method,
            window_size: REALTIME_WINDOW_SIZE,
            hop_size: REALTIME_HOP_SIZE,
            sample_rate,
        }
    }

    /// Reject geometry the analysers cannot run with
    pub fn validate(&self) -> WrapperResult<()> {
        if !(2..=MAX_WINDOW_SIZE).contains(&self.window_size) {
            return Err(WrapperError::invalid(
                "window_size",
                format!(
                    "must be in 2..={} (got {})",
                    MAX_WINDOW_SIZE, self.window_size
                ),
            ));
        }
        if self.hop_size < 1 {
            return Err(WrapperError::invalid("hop_size", "must be at least 1"));
        }
        if self.hop_size > self.window_size {
            return Err(WrapperError::invalid(
                "hop_size",
                format!(
                    "{} exceeds window_size {}",
                    self.hop_size, self.window_size
                ),
            ));
        }
        if !(1..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(WrapperError::invalid(
                "sample_rate",
                format!(
                    "must be in 1..={} (got {})",
                    MAX_SAMPLE_RATE, self.sample_rate
                ),
            ));
        }
        Ok(())
    }
}

/// aubio refused to build an analyser for otherwise valid geometry
///
/// The bundled FFT only handles power-of-two windows, so this is what a
/// 1000-sample window ends up as.
fn rejected(err: aubio::Error, params: &AnalysisParams) -> WrapperError {
    WrapperError::invalid(
        "window_size",
        format!(
            "aubio rejected window={} hop={} rate={}: {}",
            params.window_size, params.hop_size, params.sample_rate, err
        ),
    )
}

/// Validate one `process` call and return the hop it consumes
fn check_io<'a>(
    params: &AnalysisParams,
    input: &'a [f32],
    output: &[f32],
) -> WrapperResult<&'a [f32]> {
    if output.is_empty() {
        return Err(WrapperError::invalid("output", "needs at least one sample"));
    }
    input
        .get(..params.hop_size)
        .ok_or(WrapperError::HopSizeMismatch {
            expected: params.hop_size,
            got: input.len(),
        })
}
