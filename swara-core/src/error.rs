//! # Error Module
//!
//! All errors produced by the analysis core. Silence, empty buffers and
//! unvoiced windows are not errors; they simply yield fewer (or no) notes.

use thiserror::Error;

/// Errors that can occur before or during an analysis pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The sample rate must be a positive number of Hz.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// The analysis configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The caller had no decoded buffer to hand over.
    #[error("no audio buffer available for analysis")]
    NoBuffer,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
