//! Configuration parameters for a pitch analysis pass

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::notes::{AggregatorSettings, DEFAULT_MIN_NOTE_DURATION_SECONDS, DEFAULT_NOTE_JOIN_GAP_SECONDS};
use crate::pitch::{DEFAULT_AMPLITUDE_FLOOR, DetectorThresholds};
use crate::segment::NoiseGate;
use crate::smoothing::DEFAULT_MAX_GAP_SECONDS;

/// Analysis configuration parameters.
///
/// Two presets cover the usual sources: [`AnalysisConfig::file`] for studio
/// recordings and [`AnalysisConfig::live_input`] for microphone takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Framing
    /// Samples per estimator window (default: 2048)
    pub window_size: usize,

    /// Samples between window starts (file: 2048, live: 512)
    pub hop_size: usize,

    // Noise gate
    /// Lowest accepted estimate in Hz (file: 60, live: 50)
    pub noise_gate_min_hz: f32,

    /// Highest accepted estimate in Hz (file: 1100, live: 1200)
    pub noise_gate_max_hz: f32,

    // Estimator
    /// YIN absolute threshold; higher accepts weaker voicing (file: 0.10, live: 0.20)
    pub pitch_threshold: f32,

    /// Minimum voicing probability (file: 0.10, live: 0.05)
    pub probability_threshold: f32,

    /// RMS below which a window is silence (default: 0.001)
    pub amplitude_floor: f32,

    // Optional stages
    /// Peak-normalize the buffer before analysis
    pub enable_normalization: bool,

    /// 3-tap median over segment frequencies
    pub enable_smoothing: bool,

    /// Interpolate across short dropouts
    pub enable_gap_fill: bool,

    /// Gaps at or above this many seconds stay silent (default: 1.5)
    pub max_gap_seconds: f64,

    // Note aggregation
    /// Runs must span strictly longer than this to become notes (default: 0.15)
    pub min_note_duration_seconds: f64,

    /// Segments further apart than this start a new run (default: 0.1)
    pub note_join_gap_seconds: f64,
}

impl AnalysisConfig {
    /// Preset for pre-mastered audio files: no overlap, tight gate, no post-processing.
    pub fn file() -> Self {
        Self {
            window_size: 2048,
            hop_size: 2048,
            noise_gate_min_hz: 60.0,
            noise_gate_max_hz: 1100.0,
            pitch_threshold: 0.10,
            probability_threshold: 0.10,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
            enable_normalization: false,
            enable_smoothing: false,
            enable_gap_fill: false,
            max_gap_seconds: DEFAULT_MAX_GAP_SECONDS,
            min_note_duration_seconds: DEFAULT_MIN_NOTE_DURATION_SECONDS,
            note_join_gap_seconds: DEFAULT_NOTE_JOIN_GAP_SECONDS,
        }
    }

    /// Preset for microphone recordings: 4x overlap, normalization, wider
    /// gate, lenient detector, smoothing and gap filling.
    pub fn live_input() -> Self {
        Self {
            hop_size: 512,
            noise_gate_min_hz: 50.0,
            noise_gate_max_hz: 1200.0,
            pitch_threshold: 0.20,
            probability_threshold: 0.05,
            enable_normalization: true,
            enable_smoothing: true,
            enable_gap_fill: true,
            ..Self::file()
        }
    }

    /// Checks internal consistency. Called before any estimator work.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(AnalysisError::Configuration("window_size must be positive".into()));
        }
        if self.hop_size == 0 {
            return Err(AnalysisError::Configuration("hop_size must be positive".into()));
        }
        if self.hop_size > self.window_size {
            return Err(AnalysisError::Configuration(format!(
                "hop_size ({}) exceeds window_size ({})",
                self.hop_size, self.window_size
            )));
        }
        if !(self.noise_gate_min_hz > 0.0) || !self.noise_gate_max_hz.is_finite() {
            return Err(AnalysisError::Configuration(format!(
                "noise gate bounds must be positive and finite, got {} Hz to {} Hz",
                self.noise_gate_min_hz, self.noise_gate_max_hz
            )));
        }
        if !(self.noise_gate_min_hz < self.noise_gate_max_hz) {
            return Err(AnalysisError::Configuration(format!(
                "noise gate minimum ({} Hz) must be below maximum ({} Hz)",
                self.noise_gate_min_hz, self.noise_gate_max_hz
            )));
        }
        for (name, value) in [
            ("pitch_threshold", self.pitch_threshold),
            ("probability_threshold", self.probability_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Configuration(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if !(self.amplitude_floor >= 0.0) {
            return Err(AnalysisError::Configuration("amplitude_floor must be non-negative".into()));
        }
        for (name, value) in [
            ("max_gap_seconds", self.max_gap_seconds),
            ("min_note_duration_seconds", self.min_note_duration_seconds),
            ("note_join_gap_seconds", self.note_join_gap_seconds),
        ] {
            if !(value >= 0.0) {
                return Err(AnalysisError::Configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn thresholds(&self) -> DetectorThresholds {
        DetectorThresholds {
            pitch_threshold: self.pitch_threshold,
            probability_threshold: self.probability_threshold,
        }
    }

    pub fn noise_gate(&self) -> NoiseGate {
        NoiseGate::new(self.noise_gate_min_hz, self.noise_gate_max_hz)
    }

    pub fn aggregator(&self) -> AggregatorSettings {
        AggregatorSettings {
            min_duration: self.min_note_duration_seconds,
            join_gap: self.note_join_gap_seconds,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::file()
    }
}
