//! Synthetic test signals
//!
//! Deterministic click tracks used by the test suites and by `beat_probe`.

use std::f32::consts::PI;

/// Frequency of the tone inside each click
const CLICK_HZ: f32 = 1000.0;

/// Decay constant of the click envelope, in samples
const CLICK_DECAY: f32 = 300.0;

/// Click length; the envelope is below -55 dB by the end
const CLICK_SAMPLES: usize = 2000;

/// One decaying sine burst
pub fn click(sample_rate: u32) -> Vec<f32> {
    (0..CLICK_SAMPLES)
        .map(|n| {
            let t = n as f32 / sample_rate as f32;
            (-(n as f32) / CLICK_DECAY).exp() * (2.0 * PI * CLICK_HZ * t).sin()
        })
        .collect()
}

/// Mono click track at `bpm`, `seconds` long, first click at sample 0
pub fn click_track(sample_rate: u32, bpm: f32, seconds: f32) -> Vec<f32> {
    let total = (sample_rate as f32 * seconds) as usize;
    let period = 60.0 * sample_rate as f64 / bpm as f64;
    let burst = click(sample_rate);
    let mut signal = vec![0.0; total];

    let mut position = 0.0_f64;
    while (position as usize) < total {
        let start = position.round() as usize;
        for (sample, value) in signal.iter_mut().skip(start).zip(burst.iter()) {
            *sample += value;
        }
        position += period;
    }

    signal
}
