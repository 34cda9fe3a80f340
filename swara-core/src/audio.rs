//! # Audio Buffer Module
//!
//! The decoded mono signal handed to the pipeline, and the peak normalizer
//! applied ahead of live-input analysis.
//!
//! ## Features
//! - Owned sample buffers with a validated sample rate
//! - Peak normalization that consumes the buffer and hands it back rescaled
//! - Silence guard so pure noise floor is never amplified

use crate::error::{AnalysisError, Result};

/// Peak amplitude the normalizer scales towards.
pub const NORMALIZATION_TARGET_PEAK: f32 = 0.9;

/// Below this peak the buffer is treated as silence and left untouched.
pub const NORMALIZATION_MIN_PEAK: f32 = 0.001;

/// A decoded mono signal at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wraps decoded samples.
    ///
    /// # Returns
    /// * `Err(AnalysisError::InvalidSampleRate)` - if `sample_rate` is zero
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the buffer in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Largest absolute sample value, 0.0 for an empty signal.
pub fn peak_amplitude(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// Rescales a buffer so its peak reaches [`NORMALIZATION_TARGET_PEAK`].
///
/// The buffer is consumed and returned together with the gain that was
/// applied. Buffers whose peak does not exceed [`NORMALIZATION_MIN_PEAK`]
/// come back unchanged with a gain of `1.0`.
pub fn normalize(buffer: SampleBuffer) -> (SampleBuffer, f32) {
    let SampleBuffer { mut samples, sample_rate } = buffer;
    let peak = peak_amplitude(&samples);
    if peak <= NORMALIZATION_MIN_PEAK {
        return (SampleBuffer { samples, sample_rate }, 1.0);
    }

    let gain = NORMALIZATION_TARGET_PEAK / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
    (SampleBuffer { samples, sample_rate }, gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_zero_sample_rate() {
        assert_eq!(
            SampleBuffer::new(vec![0.0; 4], 0),
            Err(AnalysisError::InvalidSampleRate(0))
        );
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = SampleBuffer::new(vec![0.0; 22050], 44100).unwrap();
        assert_relative_eq!(buffer.duration(), 0.5);
    }

    #[test]
    fn quiet_signal_is_scaled_to_target_peak() {
        let buffer = SampleBuffer::new(vec![0.01, -0.05, 0.02], 8000).unwrap();
        let (normalized, gain) = normalize(buffer);
        assert_relative_eq!(gain, 18.0, epsilon = 1e-4);
        assert_relative_eq!(peak_amplitude(normalized.samples()), 0.9, epsilon = 1e-6);
        assert_relative_eq!(normalized.samples()[0], 0.18, epsilon = 1e-6);
    }

    #[test]
    fn near_silence_is_left_alone() {
        let samples = vec![0.0005, -0.001, 0.0];
        let buffer = SampleBuffer::new(samples.clone(), 8000).unwrap();
        let (normalized, gain) = normalize(buffer);
        assert_eq!(gain, 1.0);
        assert_eq!(normalized.samples(), samples.as_slice());
    }

    #[test]
    fn empty_buffer_normalizes_to_itself() {
        let (normalized, gain) = normalize(SampleBuffer::new(Vec::new(), 8000).unwrap());
        assert!(normalized.is_empty());
        assert_eq!(gain, 1.0);
    }
}
