//! # Segment Module
//!
//! Slides the estimator over a buffer and turns the resulting frequency
//! stream into time-stamped pitch segments.
//!
//! Frames whose estimate is missing or outside the noise gate produce no
//! segment at all, so silences show up as gaps between segments rather than
//! as zero-frequency placeholders.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::pitch::FrequencyEstimator;

/// One estimator result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyFrame {
    /// Position in the frame stream.
    pub index: usize,
    /// Offset of the window start in seconds.
    pub time: f64,
    pub frequency: Option<f32>,
}

/// A stretch of time carrying one frequency estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub frequency: f32,
    /// Set for segments invented by gap interpolation.
    #[serde(default)]
    pub synthetic: bool,
}

impl PitchSegment {
    pub fn new(start_time: f64, end_time: f64, frequency: f32) -> Self {
        Self { start_time, end_time, frequency, synthetic: false }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Inclusive frequency range of plausible estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseGate {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl NoiseGate {
    pub fn new(min_hz: f32, max_hz: f32) -> Self {
        Self { min_hz, max_hz }
    }

    pub fn admits(&self, frequency: f32) -> bool {
        frequency >= self.min_hz && frequency <= self.max_hz
    }
}

/// Seconds between consecutive frames.
pub fn frame_period(hop_size: usize, sample_rate: u32) -> f64 {
    hop_size as f64 / sample_rate as f64
}

/// Runs `estimator` over every full window of `samples`.
///
/// Windows start at multiples of `config.hop_size`; a trailing partial window
/// is not analyzed.
pub fn frame_stream<E: FrequencyEstimator + ?Sized>(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    estimator: &E,
) -> Vec<FrequencyFrame> {
    let window = config.window_size;
    let hop = config.hop_size;
    if window == 0 || hop == 0 || samples.len() < window {
        return Vec::new();
    }

    let period = frame_period(hop, sample_rate);
    let thresholds = config.thresholds();
    (0..=(samples.len() - window) / hop)
        .map(|index| {
            let start = index * hop;
            FrequencyFrame {
                index,
                time: index as f64 * period,
                frequency: estimator.estimate(&samples[start..start + window], sample_rate, &thresholds),
            }
        })
        .collect()
}

/// Converts gated frames into segments.
///
/// Frame `k` covers `[k * frame_period, (k + 1) * frame_period)`.
pub fn build_segments(
    frames: &[FrequencyFrame],
    frame_period: f64,
    gate: NoiseGate,
) -> Vec<PitchSegment> {
    frames
        .iter()
        .filter_map(|frame| {
            let frequency = frame
                .frequency
                .filter(|&f| f.is_finite() && f > 0.0 && gate.admits(f))?;
            Some(PitchSegment::new(
                frame.index as f64 * frame_period,
                (frame.index + 1) as f64 * frame_period,
                frequency,
            ))
        })
        .collect()
}
