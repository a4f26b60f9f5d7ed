// OnsetDetector - note and percussive onset detection on hop-sized blocks
//
// Owns one `aubio::Onset`. aubio runs the phase vocoder, the spectral
// descriptor, adaptive peak picking, the silence gate and the minimum
// inter-onset debounce; this type validates what goes in and keeps count of
// the samples consumed so the last-onset position reads 0 until aubio has
// actually marked one.

use aubio::Onset;

use crate::config::OnsetConfig;
use crate::error::{WrapperError, WrapperResult};

use super::method::Method;
use super::{check_io, rejected, AnalysisParams};

/// OnsetDetector reports note and percussive onsets hop by hop
pub struct OnsetDetector {
    params: AnalysisParams,
    onset: Onset,
    /// Samples consumed since creation or the last reset
    consumed: u64,
}

impl OnsetDetector {
    /// Create an onset detector with aubio's defaults for the method
    ///
    /// # Errors
    /// `InvalidParameter` when the window, hop or sample rate is unusable.
    pub fn new(params: AnalysisParams) -> WrapperResult<Self> {
        Self::with_config(params, &OnsetConfig::default())
    }

    /// Create a detector, overriding the tunables `config` sets
    pub fn with_config(params: AnalysisParams, config: &OnsetConfig) -> WrapperResult<Self> {
        params.validate()?;

        let onset = Onset::new(
            params.method.for_onset().onset_mode(),
            params.window_size,
            params.hop_size,
            params.sample_rate,
        )
        .map_err(|err| rejected(err, &params))?;

        let mut detector = Self {
            params,
            onset,
            consumed: 0,
        };
        if let Some(silence_db) = config.silence_db {
            detector.set_silence(silence_db)?;
        }
        if let Some(threshold) = config.threshold {
            detector.set_threshold(threshold)?;
        }
        if let Some(minioi_ms) = config.minioi_ms {
            detector.set_minioi_ms(minioi_ms)?;
        }

        log::debug!(
            "onset detector ready: method={} window={} hop={} rate={} threshold={}",
            detector.params.method,
            detector.params.window_size,
            detector.params.hop_size,
            detector.params.sample_rate,
            detector.threshold()
        );
        Ok(detector)
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Method the detector was created with (`Default` stays `Default`)
    pub fn method(&self) -> Method {
        self.params.method
    }

    /// Process one hop
    ///
    /// Consumes the first `hop_size` samples of `input`; aubio writes a
    /// non-zero value to `output[0]` when an onset was detected.
    ///
    /// # Errors
    /// - `HopSizeMismatch` if `input` holds fewer than `hop_size` samples
    /// - `InvalidParameter` if `output` is empty
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> WrapperResult<bool> {
        let hop = check_io(&self.params, input, output)?;

        self.onset
            .do_(hop, &mut output[..1])
            .map_err(|_| WrapperError::HopSizeMismatch {
                expected: self.params.hop_size,
                got: input.len(),
            })?;
        self.consumed += self.params.hop_size as u64;

        Ok(output[0] != 0.0)
    }

    /// Sample position of the last onset (0 before the first one)
    pub fn last(&self) -> u64 {
        // aubio subtracts its detection delay from an unsigned zero until
        // the first onset; anything past the consumed samples is that wrap
        let last = self.onset.get_last() as u64;
        if last > self.consumed {
            0
        } else {
            last
        }
    }

    pub fn last_s(&self) -> f32 {
        self.last() as f32 / self.params.sample_rate as f32
    }

    pub fn last_ms(&self) -> f32 {
        self.last_s() * 1000.0
    }

    /// Raw descriptor value of the most recent hop
    pub fn descriptor(&self) -> f32 {
        self.onset.get_descriptor()
    }

    /// Descriptor value minus the adaptive threshold
    pub fn thresholded_descriptor(&self) -> f32 {
        self.onset.get_thresholded_descriptor()
    }

    pub fn silence(&self) -> f32 {
        self.onset.get_silence()
    }

    /// Set the silence gate in dB
    pub fn set_silence(&mut self, silence_db: f32) -> WrapperResult<()> {
        if !silence_db.is_finite() {
            return Err(WrapperError::invalid("silence", "must be finite"));
        }
        self.onset.set_silence(silence_db);
        Ok(())
    }

    pub fn threshold(&self) -> f32 {
        self.onset.get_threshold()
    }

    /// Set the peak-picking threshold
    pub fn set_threshold(&mut self, threshold: f32) -> WrapperResult<()> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(WrapperError::invalid(
                "threshold",
                format!("must be finite and >= 0 (got {})", threshold),
            ));
        }
        self.onset.set_threshold(threshold);
        Ok(())
    }

    pub fn minioi_ms(&self) -> f32 {
        self.onset.get_minioi_ms()
    }

    /// Set the minimum inter-onset interval in milliseconds
    pub fn set_minioi_ms(&mut self, minioi_ms: f32) -> WrapperResult<()> {
        if !minioi_ms.is_finite() || minioi_ms < 0.0 {
            return Err(WrapperError::invalid(
                "minioi_ms",
                format!("must be finite and >= 0 (got {})", minioi_ms),
            ));
        }
        self.onset.set_minioi_ms(minioi_ms);
        Ok(())
    }

    /// Forget the last onset and restart the sample clock
    pub fn reset(&mut self) {
        self.onset.reset();
        self.consumed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::signals::click_track;
    use approx::assert_relative_eq;

    const RATE: u32 = 44100;
    const HOP: usize = 512;

    fn detector(method: Method) -> OnsetDetector {
        OnsetDetector::new(AnalysisParams::realtime(method, RATE)).unwrap()
    }

    /// Hop with a short burst of energy (10 samples) at `offset`
    fn burst_hop(offset: usize) -> Vec<f32> {
        let mut hop = vec![0.0; HOP];
        for sample in hop.iter_mut().skip(offset).take(10) {
            *sample = 1.0;
        }
        hop
    }

    /// `silent` empty hops, then a burst, then `after` empty hops
    fn isolated_burst(silent: usize, after: usize) -> Vec<Vec<f32>> {
        let mut hops: Vec<Vec<f32>> = (0..silent).map(|_| vec![0.0; HOP]).collect();
        hops.push(burst_hop(100));
        hops.extend((0..after).map(|_| vec![0.0; HOP]));
        hops
    }

    fn count_onsets(detector: &mut OnsetDetector, hops: &[Vec<f32>]) -> usize {
        let mut out = [0.0];
        hops.iter()
            .filter(|hop| detector.process(hop, &mut out).unwrap())
            .count()
    }

    #[test]
    fn test_onset_detector_detects_impulse() {
        let mut detector = detector(Method::Default);
        assert_eq!(detector.last(), 0);

        assert!(count_onsets(&mut detector, &isolated_burst(20, 4)) >= 1);
        let last = detector.last();
        assert!(last > 0 && last <= 24 * HOP as u64, "onset at {}", last);
    }

    #[test]
    fn test_every_method_sees_a_click_track() {
        let signal = click_track(RATE, 120.0, 4.0);
        let hops: Vec<Vec<f32>> = signal.chunks_exact(HOP).map(<[f32]>::to_vec).collect();

        for method in Method::ALL {
            let mut detector = detector(method);
            assert!(
                count_onsets(&mut detector, &hops) >= 1,
                "{} missed every click",
                method
            );
        }
    }

    #[test]
    fn test_no_false_positives_on_silence() {
        let mut detector = detector(Method::Default);
        let mut out = [0.0];
        for _ in 0..(RATE as usize / HOP) {
            assert!(!detector.process(&[0.0; HOP], &mut out).unwrap());
            assert_eq!(out[0], 0.0);
        }
        assert_eq!(detector.last(), 0);
    }

    #[test]
    fn test_silence_gate_suppresses_quiet_bursts() {
        let mut detector = detector(Method::Energy);
        detector.set_silence(-10.0).unwrap();
        // 10 full-scale samples in 512 sit around -17 dB
        assert_eq!(count_onsets(&mut detector, &isolated_burst(20, 4)), 0);
    }

    #[test]
    fn test_minioi_debounces() {
        let mut hops: Vec<Vec<f32>> = (0..20).map(|_| vec![0.0; HOP]).collect();
        for _ in 0..5 {
            hops.push(burst_hop(50));
            hops.extend((0..9).map(|_| vec![0.0; HOP]));
        }

        let mut debounced = detector(Method::Energy);
        debounced.set_minioi_ms(2000.0).unwrap();
        assert!(count_onsets(&mut debounced, &hops) <= 1);

        let mut open = detector(Method::Energy);
        open.set_minioi_ms(0.0).unwrap();
        assert!(count_onsets(&mut open, &hops) >= 2);
    }

    #[test]
    fn test_reset_restarts_the_clock() {
        let mut detector = detector(Method::Energy);
        count_onsets(&mut detector, &isolated_burst(20, 4));
        assert!(detector.last() > 0);

        detector.reset();
        assert_eq!(detector.last(), 0);
        assert_eq!(detector.last_ms(), 0.0);

        count_onsets(&mut detector, &isolated_burst(20, 4));
        assert!(detector.last() <= 25 * HOP as u64);
    }

    #[test]
    fn test_method_defaults_come_from_aubio() {
        let hfc = detector(Method::Default);
        assert_relative_eq!(hfc.threshold(), 0.058, epsilon = 1e-6);
        assert_eq!(hfc.silence(), -70.0);
        assert_relative_eq!(hfc.minioi_ms(), 50.0, epsilon = 0.05);

        let energy = detector(Method::Energy);
        assert_relative_eq!(energy.threshold(), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_config_overrides_defaults() {
        let config = OnsetConfig {
            silence_db: None,
            threshold: Some(0.5),
            minioi_ms: Some(100.0),
        };
        let detector =
            OnsetDetector::with_config(AnalysisParams::realtime(Method::Hfc, RATE), &config)
                .unwrap();
        assert_relative_eq!(detector.threshold(), 0.5);
        assert_relative_eq!(detector.minioi_ms(), 100.0, epsilon = 0.05);
        assert_eq!(detector.silence(), -70.0);
    }

    #[test]
    fn test_setters_validate() {
        let mut detector = detector(Method::Hfc);
        assert!(detector.set_threshold(f32::NAN).is_err());
        assert!(detector.set_threshold(-0.1).is_err());
        assert!(detector.set_minioi_ms(-5.0).is_err());
        assert!(detector.set_silence(f32::INFINITY).is_err());

        detector.set_threshold(0.7).unwrap();
        detector.set_minioi_ms(20.0).unwrap();
        detector.set_silence(-50.0).unwrap();
        assert_relative_eq!(detector.threshold(), 0.7);
        assert_relative_eq!(detector.minioi_ms(), 20.0, epsilon = 0.05);
        assert_eq!(detector.silence(), -50.0);
    }

    #[test]
    fn test_short_input_rejected() {
        let mut detector = detector(Method::Hfc);
        let mut out = [0.0];
        assert_eq!(
            detector.process(&[0.0; 100], &mut out),
            Err(WrapperError::HopSizeMismatch {
                expected: HOP,
                got: 100
            })
        );
    }

    #[test]
    fn test_timestamps_in_three_units() {
        let mut detector = detector(Method::Energy);
        count_onsets(&mut detector, &isolated_burst(86, 4));
        let last = detector.last();
        assert!(last > 0);
        assert_relative_eq!(detector.last_s(), last as f32 / RATE as f32);
        assert_relative_eq!(detector.last_ms(), detector.last_s() * 1000.0);
    }

    #[test]
    fn test_longer_input_consumes_one_hop() {
        let mut detector = detector(Method::Hfc);
        let mut out = [0.0; 4];
        detector.process(&[0.0; 3 * HOP], &mut out).unwrap();
        assert_eq!(&out[1..], &[0.0; 3]);
    }
}
