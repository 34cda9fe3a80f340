//! # Pitch Detection Module
//!
//! The fundamental-frequency estimator contract and the YIN estimator the
//! pipeline uses by default.
//!
//! An estimator looks at one window of samples at a time and either returns a
//! frequency in Hz or reports "no pitch". It keeps no memory between windows,
//! so file and live-input analysis only differ in the thresholds they pass.
//!
//! ## Features
//! - Function-shaped [`FrequencyEstimator`] trait (closures implement it)
//! - YIN with FFT difference function and parabolic interpolation
//! - Amplitude gating to filter out silence

use serde::{Deserialize, Serialize};

use crate::fft;

/// Confidence parameters handed to an estimator with every window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorThresholds {
    /// YIN absolute threshold. Higher values accept less periodic windows.
    pub pitch_threshold: f32,
    /// Minimum voicing probability (1 - normalized difference) to report a pitch.
    pub probability_threshold: f32,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            pitch_threshold: 0.10,
            probability_threshold: 0.10,
        }
    }
}

/// Estimates the fundamental frequency of a single window.
pub trait FrequencyEstimator {
    /// Returns the frequency in Hz, or `None` when the window is unvoiced,
    /// ambiguous or too quiet.
    fn estimate(
        &self,
        window: &[f32],
        sample_rate: u32,
        thresholds: &DetectorThresholds,
    ) -> Option<f32>;
}

impl<F> FrequencyEstimator for F
where
    F: Fn(&[f32], u32, &DetectorThresholds) -> Option<f32>,
{
    fn estimate(
        &self,
        window: &[f32],
        sample_rate: u32,
        thresholds: &DetectorThresholds,
    ) -> Option<f32> {
        self(window, sample_rate, thresholds)
    }
}

/// Default RMS below which a window counts as silence.
pub const DEFAULT_AMPLITUDE_FLOOR: f32 = 0.001;

/// YIN pitch estimator with an RMS silence gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinEstimator {
    /// Windows with a lower RMS are reported as "no pitch".
    pub amplitude_floor: f32,
}

impl YinEstimator {
    pub fn new(amplitude_floor: f32) -> Self {
        Self { amplitude_floor }
    }
}

impl Default for YinEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_AMPLITUDE_FLOOR)
    }
}

impl FrequencyEstimator for YinEstimator {
    fn estimate(
        &self,
        window: &[f32],
        sample_rate: u32,
        thresholds: &DetectorThresholds,
    ) -> Option<f32> {
        detect_pitch_yin(window, sample_rate, thresholds, self.amplitude_floor)
    }
}

/// Root-mean-square level of a window.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// YIN pitch detection over one window.
///
/// # Arguments
/// * `signal` - One analysis window
/// * `sample_rate` - Sample rate in Hz
/// * `thresholds` - Absolute YIN threshold and voicing probability floor
/// * `amplitude_threshold` - Minimum RMS for pitch detection
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No pitch detected (silence, noise, or invalid signal)
pub fn detect_pitch_yin(
    signal: &[f32],
    sample_rate: u32,
    thresholds: &DetectorThresholds,
    amplitude_threshold: f32,
) -> Option<f32> {
    let half = signal.len() / 2;
    if half < 3 || sample_rate == 0 {
        return None;
    }

    // --- Noise Gate ---
    if rms(signal) < amplitude_threshold {
        return None;
    }

    let mut centered: Vec<f64> = signal.iter().map(|&s| s as f64).collect();
    fft::remove_dc_offset(&mut centered);

    // --- Steps 1 & 2: squared difference ---
    let mut yin_buffer = fft::difference_function(&centered, half);

    // --- Step 3: cumulative mean normalized difference ---
    yin_buffer[0] = 1.0;
    let mut running_sum = 0.0;
    for tau in 1..half {
        running_sum += yin_buffer[tau];
        if running_sum > 0.0 {
            yin_buffer[tau] *= tau as f64 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    // --- Step 4: absolute threshold, then slide to the bottom of the dip ---
    let threshold = thresholds.pitch_threshold as f64;
    let mut period = None;
    let mut tau = 2;
    while tau < half {
        if yin_buffer[tau] < threshold {
            while tau + 1 < half && yin_buffer[tau + 1] < yin_buffer[tau] {
                tau += 1;
            }
            period = Some(tau);
            break;
        }
        tau += 1;
    }
    let period = period?;

    let probability = 1.0 - yin_buffer[period];
    if probability < thresholds.probability_threshold as f64 {
        return None;
    }

    // --- Step 5: parabolic interpolation ---
    let period_float = if period + 1 < half {
        let y1 = yin_buffer[period - 1];
        let y2 = yin_buffer[period];
        let y3 = yin_buffer[period + 1];
        let denominator = y1 - 2.0 * y2 + y3;
        if denominator.abs() > f64::EPSILON {
            period as f64 + (y1 - y3) / (2.0 * denominator)
        } else {
            period as f64
        }
    } else {
        period as f64
    };

    let frequency = (sample_rate as f64 / period_float) as f32;
    if frequency.is_finite() && frequency > 0.0 {
        Some(frequency)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(frequency: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn detects_a440() {
        let window = sine(440.0, 44100, 2048, 0.5);
        let freq = YinEstimator::default()
            .estimate(&window, 44100, &DetectorThresholds::default())
            .expect("pitch");
        assert_relative_eq!(freq, 440.0, max_relative = 0.01);
    }

    #[test]
    fn detects_low_and_high_voices() {
        let thresholds = DetectorThresholds::default();
        for target in [110.0, 220.0, 660.0, 880.0] {
            let window = sine(target, 44100, 2048, 0.5);
            let freq = detect_pitch_yin(&window, 44100, &thresholds, DEFAULT_AMPLITUDE_FLOOR)
                .expect("pitch");
            assert_relative_eq!(freq, target, max_relative = 0.01);
        }
    }

    #[test]
    fn silence_has_no_pitch() {
        let window = vec![0.0; 2048];
        assert_eq!(
            YinEstimator::default().estimate(&window, 44100, &DetectorThresholds::default()),
            None
        );
    }

    #[test]
    fn quiet_signal_is_gated() {
        let window = sine(440.0, 44100, 2048, 0.0005);
        assert_eq!(
            YinEstimator::default().estimate(&window, 44100, &DetectorThresholds::default()),
            None
        );
    }

    #[test]
    fn tiny_windows_are_rejected() {
        assert_eq!(
            detect_pitch_yin(&[0.5, -0.5, 0.5, -0.5], 8000, &DetectorThresholds::default(), 0.0),
            None
        );
    }

    #[test]
    fn closures_are_estimators() {
        let fixed = |_: &[f32], _: u32, _: &DetectorThresholds| Some(261.6_f32);
        assert_eq!(fixed.estimate(&[], 44100, &DetectorThresholds::default()), Some(261.6));
    }
}
