// Convenience façade - process raw sample slices without managing buffers
//
// Mirrors the exported `wrapper_process_tempo` / `wrapper_process_onset`
// calls: copy the caller's samples into a temporary input buffer, run one
// `process`, read the flag from a one-sample output buffer. The temporaries
// are owned values, so every exit path (including a failed second
// allocation) releases whatever was allocated.

use crate::analysis::{OnsetDetector, TempoTracker};
use crate::buffer::SampleBuffer;
use crate::error::{WrapperError, WrapperResult};

/// Result of one façade tempo call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoStep {
    pub beat: bool,
    pub bpm: f32,
}

/// Allocate the input buffer and an `output_len` output buffer for one call
///
/// If the output allocation fails the input buffer is dropped on the way out.
fn scratch(samples: &[f32], output_len: usize) -> WrapperResult<(SampleBuffer, SampleBuffer)> {
    if samples.is_empty() {
        return Err(WrapperError::invalid("samples", "must not be empty"));
    }
    let input = SampleBuffer::from_slice(samples)?;
    let output = SampleBuffer::new(output_len)?;
    Ok((input, output))
}

/// Feed `samples` to `tracker` and report the beat flag with the current BPM
pub fn process_tempo(tracker: &mut TempoTracker, samples: &[f32]) -> WrapperResult<TempoStep> {
    let (input, mut output) = scratch(samples, 1)?;
    tracker.process(input.as_slice(), output.as_mut_slice())?;

    Ok(TempoStep {
        beat: output.get(0)? > 0.0,
        bpm: tracker.bpm(),
    })
}

/// Feed `samples` to `detector` and report whether an onset occurred
pub fn process_onset(detector: &mut OnsetDetector, samples: &[f32]) -> WrapperResult<bool> {
    let (input, mut output) = scratch(samples, 1)?;
    detector.process(input.as_slice(), output.as_mut_slice())?;
    Ok(output.get(0)? > 0.0)
}
