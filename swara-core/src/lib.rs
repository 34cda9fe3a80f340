// swara-core/src/lib.rs

//! The core logic for the swara pitch analyzer.
//! This crate turns a decoded mono signal into a list of stable note events
//! (start, end, frequency, note name, scale-degree label). It is completely
//! headless: no decoding, no audio devices, no rendering.
//!
//! ```no_run
//! use swara_core::{analyze, AnalysisConfig};
//!
//! let samples: Vec<f32> = vec![]; // decoded mono audio
//! let notes = analyze(samples, 44100, &AnalysisConfig::file())?;
//! for note in &notes {
//!     println!("{:.2}-{:.2}s {}", note.start_time, note.end_time, note.note_name);
//! }
//! # Ok::<(), swara_core::AnalysisError>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod notes;
pub mod pipeline;
pub mod pitch;
pub mod segment;
pub mod smoothing;
pub mod tuning;

pub use audio::SampleBuffer;
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use notes::{StableNoteEvent, find_active_note};
pub use pipeline::{Analysis, AnalysisObserver, Pipeline, Stage, TracingObserver, analyze};
pub use pitch::{DetectorThresholds, FrequencyEstimator, YinEstimator};
pub use segment::PitchSegment;
pub use tuning::{LabelConfig, NoteLabeler, PitchClass};
