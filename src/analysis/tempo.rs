// TempoTracker - beat tracking on hop-sized blocks
//
// Owns one `aubio::Tempo`. Geometry and tunables are validated here, then
// every call is forwarded; tempo, period, confidence and beat positions are
// aubio's own.

use aubio::Tempo;

use crate::config::TempoConfig;
use crate::error::{WrapperError, WrapperResult};

use super::method::Method;
use super::{check_io, rejected, AnalysisParams};

/// Beat tracker with tempo statistics
pub struct TempoTracker {
    params: AnalysisParams,
    tempo: Tempo,
}

impl TempoTracker {
    /// Create a tempo tracker with aubio's default tunables
    ///
    /// # Errors
    /// `InvalidParameter` when the window, hop or sample rate is unusable.
    pub fn new(params: AnalysisParams) -> WrapperResult<Self> {
        Self::with_config(params, &TempoConfig::default())
    }

    /// Create a tracker with explicit initial tunables
    pub fn with_config(params: AnalysisParams, config: &TempoConfig) -> WrapperResult<Self> {
        params.validate()?;

        let tempo = Tempo::new(
            params.method.for_tempo().onset_mode(),
            params.window_size,
            params.hop_size,
            params.sample_rate,
        )
        .map_err(|err| rejected(err, &params))?;

        let mut tracker = Self { params, tempo };
        if let Some(silence_db) = config.silence_db {
            tracker.set_silence(silence_db)?;
        }
        if let Some(threshold) = config.threshold {
            tracker.set_threshold(threshold)?;
        }

        log::debug!(
            "tempo tracker ready: method={} window={} hop={} rate={}",
            tracker.params.method,
            tracker.params.window_size,
            tracker.params.hop_size,
            tracker.params.sample_rate
        );
        Ok(tracker)
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    pub fn method(&self) -> Method {
        self.params.method
    }

    /// Process one hop
    ///
    /// Consumes the first `hop_size` samples of `input`. aubio writes the
    /// beat's fractional position inside the hop to `output[0]`; it is 0.0
    /// when no beat falls in the hop. Returns whether `output[0]` is non-zero.
    ///
    /// # Errors
    /// - `HopSizeMismatch` if `input` holds fewer than `hop_size` samples
    /// - `InvalidParameter` if `output` is empty
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> WrapperResult<bool> {
        let hop = check_io(&self.params, input, output)?;

        self.tempo
            .do_(hop, &mut output[..1])
            .map_err(|_| WrapperError::HopSizeMismatch {
                expected: self.params.hop_size,
                got: input.len(),
            })?;

        Ok(output[0] != 0.0)
    }

    /// Sample position of the last beat
    pub fn last(&self) -> u64 {
        self.tempo.get_last() as u64
    }

    pub fn last_s(&self) -> f32 {
        self.tempo.get_last_s()
    }

    pub fn last_ms(&self) -> f32 {
        self.tempo.get_last_ms()
    }

    /// Current tempo estimate
    pub fn bpm(&self) -> f32 {
        self.tempo.get_bpm()
    }

    /// Beat period in samples
    pub fn period(&self) -> f32 {
        self.tempo.get_period() as f32
    }

    /// Beat period in seconds
    pub fn period_s(&self) -> f32 {
        self.tempo.get_period_s()
    }

    pub fn confidence(&self) -> f32 {
        self.tempo.get_confidence()
    }

    pub fn silence(&self) -> f32 {
        self.tempo.get_silence()
    }

    /// Set the silence gate in dB
    pub fn set_silence(&mut self, silence_db: f32) -> WrapperResult<()> {
        if !silence_db.is_finite() {
            return Err(WrapperError::invalid("silence", "must be finite"));
        }
        self.tempo.set_silence(silence_db);
        Ok(())
    }

    pub fn threshold(&self) -> f32 {
        self.tempo.get_threshold()
    }

    /// Set the peak-picking threshold applied to the detection function
    pub fn set_threshold(&mut self, threshold: f32) -> WrapperResult<()> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(WrapperError::invalid(
                "threshold",
                format!("must be finite and >= 0 (got {})", threshold),
            ));
        }
        self.tempo.set_threshold(threshold);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::signals::click_track;

    const RATE: u32 = 44100;
    const HOP: usize = 512;

    fn tracker() -> TempoTracker {
        TempoTracker::new(AnalysisParams::realtime(Method::Default, RATE)).unwrap()
    }

    #[test]
    fn test_silence_never_beats() {
        let mut tracker = tracker();
        let mut out = [0.0];
        for _ in 0..2000 {
            assert!(!tracker.process(&[0.0; HOP], &mut out).unwrap());
            assert_eq!(out[0], 0.0);
        }
    }

    #[test]
    fn test_click_track_converges_to_120_bpm() {
        let mut tracker = tracker();
        let signal = click_track(RATE, 120.0, 20.0);
        let mut out = [0.0];
        let mut beats = 0;

        for (i, hop) in signal.chunks_exact(HOP).enumerate() {
            if tracker.process(hop, &mut out).unwrap() && i * HOP > signal.len() / 2 {
                beats += 1;
                assert!(out[0] > 0.0 && out[0] < 1.0);
            }
        }

        let bpm = tracker.bpm();
        assert!((bpm - 120.0).abs() < 4.0, "converged to {} BPM", bpm);
        assert!((tracker.period_s() - 0.5).abs() < 0.03);
        assert!((tracker.period() - 22050.0).abs() < 1300.0);
        assert!(tracker.confidence() > 0.0);
        assert!(beats >= 5, "only {} beats in the second half", beats);
    }

    #[test]
    fn test_last_beat_units_agree() {
        let mut tracker = tracker();
        let signal = click_track(RATE, 100.0, 12.0);
        let mut out = [0.0];
        for hop in signal.chunks_exact(HOP) {
            tracker.process(hop, &mut out).unwrap();
        }
        assert!(tracker.last() > 0);
        assert!((tracker.last_s() - tracker.last() as f32 / RATE as f32).abs() < 1e-3);
        assert!((tracker.last_ms() - tracker.last_s() * 1000.0).abs() < 1e-1);
    }

    #[test]
    fn test_threshold_and_silence_round_trip() {
        let mut tracker = tracker();
        assert_eq!(tracker.silence(), -90.0);
        assert_eq!(tracker.threshold(), 0.3);

        tracker.set_silence(-40.0).unwrap();
        tracker.set_threshold(0.1).unwrap();
        assert_eq!(tracker.silence(), -40.0);
        assert_eq!(tracker.threshold(), 0.1);

        assert!(tracker.set_threshold(f32::NAN).is_err());
        assert_eq!(tracker.threshold(), 0.1);
    }

    #[test]
    fn test_config_overrides_aubio_defaults() {
        let config = TempoConfig {
            silence_db: Some(-50.0),
            threshold: None,
        };
        let tracker =
            TempoTracker::with_config(AnalysisParams::realtime(Method::Kl, RATE), &config).unwrap();
        assert_eq!(tracker.silence(), -50.0);
        assert_eq!(tracker.threshold(), 0.3);

        let bad = TempoConfig {
            silence_db: Some(f32::NAN),
            threshold: None,
        };
        assert!(
            TempoTracker::with_config(AnalysisParams::realtime(Method::Kl, RATE), &bad).is_err()
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        for (window_size, hop_size) in [(256, 512), (1000, 500)] {
            let bad = AnalysisParams {
                method: Method::Default,
                window_size,
                hop_size,
                sample_rate: RATE,
            };
            assert!(matches!(
                TempoTracker::new(bad),
                Err(WrapperError::InvalidParameter { .. })
            ));
        }
    }
}
