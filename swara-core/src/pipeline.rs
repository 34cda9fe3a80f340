//! # Pipeline Module
//!
//! Runs the analysis stages in order over one buffer:
//!
//! ```text
//! SampleBuffer → [normalize] → frames → segments → [median] → [gap fill] → notes → [labels]
//! ```
//!
//! Bracketed stages are switched by [`AnalysisConfig`] flags (or by attaching
//! a [`NoteLabeler`]), so file and live-input analysis share one code path.
//! Each stage consumes its predecessor's output; nothing is shared between
//! passes, so independent pipelines may run on separate threads.

use tracing::{debug, debug_span};

use crate::audio::{self, SampleBuffer};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::notes::{self, StableNoteEvent};
use crate::pitch::{FrequencyEstimator, YinEstimator};
use crate::segment::{self, PitchSegment};
use crate::smoothing;
use crate::tuning::NoteLabeler;

/// The stages an observer can hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Normalize,
    Estimate,
    Segment,
    Smooth,
    FillGaps,
    Aggregate,
    Label,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Estimate => "estimate",
            Stage::Segment => "segment",
            Stage::Smooth => "smooth",
            Stage::FillGaps => "fill_gaps",
            Stage::Aggregate => "aggregate",
            Stage::Label => "label",
        }
    }
}

/// Diagnostics hook. Every method defaults to doing nothing.
pub trait AnalysisObserver {
    /// A stage finished; `items` is the size of its output
    /// (samples, frames, segments or notes).
    fn stage_completed(&self, _stage: Stage, _items: usize) {}

    /// The normalizer ran and applied `gain`.
    fn normalized(&self, _peak: f32, _gain: f32) {}
}

/// Forwards stage reports to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn stage_completed(&self, stage: Stage, items: usize) {
        debug!(stage = stage.name(), items, "stage completed");
    }

    fn normalized(&self, peak: f32, gain: f32) {
        debug!(peak, gain, "buffer normalized");
    }
}

/// Everything a pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Post-processed segment contour, for drawing a pitch curve.
    pub segments: Vec<PitchSegment>,
    pub notes: Vec<StableNoteEvent>,
    pub duration_seconds: f64,
    /// Gain the normalizer applied (1.0 when it did not run or left the buffer alone).
    pub normalization_gain: f32,
}

/// Optional passes over the segment list, applied in order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SegmentPass {
    Median,
    FillGaps { max_gap: f64 },
}

impl SegmentPass {
    fn stage(self) -> Stage {
        match self {
            SegmentPass::Median => Stage::Smooth,
            SegmentPass::FillGaps { .. } => Stage::FillGaps,
        }
    }

    fn apply(self, segments: Vec<PitchSegment>, frame_period: f64) -> Vec<PitchSegment> {
        match self {
            SegmentPass::Median => smoothing::median_smooth(segments),
            SegmentPass::FillGaps { max_gap } => smoothing::fill_gaps(segments, frame_period, max_gap),
        }
    }
}

/// A configured analysis pipeline.
pub struct Pipeline<E = YinEstimator> {
    config: AnalysisConfig,
    estimator: E,
    labeler: Option<NoteLabeler>,
    observer: Option<Box<dyn AnalysisObserver + Send + Sync>>,
}

impl Pipeline<YinEstimator> {
    /// Pipeline with the YIN estimator.
    ///
    /// # Returns
    /// * `Err(AnalysisError::Configuration)` - if `config` is inconsistent
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let estimator = YinEstimator::new(config.amplitude_floor);
        Self::with_estimator(config, estimator)
    }
}

impl<E: FrequencyEstimator> Pipeline<E> {
    /// Pipeline with a caller-supplied estimator.
    pub fn with_estimator(config: AnalysisConfig, estimator: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            estimator,
            labeler: None,
            observer: None,
        })
    }

    /// Fills `scale_degree_label` on every note using `labeler`.
    pub fn with_labeler(mut self, labeler: NoteLabeler) -> Self {
        self.labeler = Some(labeler);
        self
    }

    pub fn with_observer(mut self, observer: impl AnalysisObserver + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn report(&self, stage: Stage, items: usize) {
        if let Some(observer) = &self.observer {
            observer.stage_completed(stage, items);
        }
    }

    fn segment_passes(&self) -> Vec<SegmentPass> {
        let mut passes = Vec::with_capacity(2);
        if self.config.enable_smoothing {
            passes.push(SegmentPass::Median);
        }
        if self.config.enable_gap_fill {
            passes.push(SegmentPass::FillGaps { max_gap: self.config.max_gap_seconds });
        }
        passes
    }

    /// Analyzes a whole buffer. The buffer is consumed.
    pub fn run(&self, buffer: SampleBuffer) -> Analysis {
        let sample_rate = buffer.sample_rate();
        let duration_seconds = buffer.duration();
        let _span = debug_span!("analysis", samples = buffer.len(), sample_rate).entered();

        let (buffer, normalization_gain) = if self.config.enable_normalization {
            let peak = audio::peak_amplitude(buffer.samples());
            let (normalized, gain) = audio::normalize(buffer);
            if let Some(observer) = &self.observer {
                observer.normalized(peak, gain);
            }
            self.report(Stage::Normalize, normalized.len());
            (normalized, gain)
        } else {
            (buffer, 1.0)
        };

        let frames = segment::frame_stream(buffer.samples(), sample_rate, &self.config, &self.estimator);
        self.report(Stage::Estimate, frames.len());
        drop(buffer);

        let frame_period = segment::frame_period(self.config.hop_size, sample_rate);
        let mut segments = segment::build_segments(&frames, frame_period, self.config.noise_gate());
        self.report(Stage::Segment, segments.len());

        for pass in self.segment_passes() {
            segments = pass.apply(segments, frame_period);
            self.report(pass.stage(), segments.len());
        }

        let mut notes = notes::aggregate(&segments, self.config.aggregator());
        self.report(Stage::Aggregate, notes.len());

        if let Some(labeler) = &self.labeler {
            labeler.apply(&mut notes);
            self.report(Stage::Label, notes.len());
        }

        debug!(
            frames = frames.len(),
            segments = segments.len(),
            notes = notes.len(),
            "analysis finished"
        );

        Analysis {
            segments,
            notes,
            duration_seconds,
            normalization_gain,
        }
    }

    /// Analyzes a buffer and keeps only the stable notes.
    pub fn analyze(&self, buffer: SampleBuffer) -> Vec<StableNoteEvent> {
        self.run(buffer).notes
    }

    /// Like [`Pipeline::run`], for callers whose decoder may have produced nothing.
    ///
    /// # Returns
    /// * `Err(AnalysisError::NoBuffer)` - if `decoded` is `None`
    pub fn analyze_decoded(&self, decoded: Option<SampleBuffer>) -> Result<Analysis> {
        decoded.map(|buffer| self.run(buffer)).ok_or(AnalysisError::NoBuffer)
    }
}

/// One-shot analysis with the YIN estimator.
///
/// # Arguments
/// * `samples` - Mono samples, consumed by the pass
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Analysis parameters
///
/// # Returns
/// * `Ok(notes)` - Stable notes in time order (empty for silence)
/// * `Err(e)` - Invalid sample rate or configuration; no estimation was attempted
pub fn analyze(samples: Vec<f32>, sample_rate: u32, config: &AnalysisConfig) -> Result<Vec<StableNoteEvent>> {
    let buffer = SampleBuffer::new(samples, sample_rate)?;
    Ok(Pipeline::new(config.clone())?.analyze(buffer))
}
