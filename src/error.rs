//! Error types for the Disruption DSP core.
//!
//! The per-sample signal path never fails: saturation and solver timeouts are
//! absorbed numerically. [`DisruptionError`] only covers the boundaries where a
//! host, a saved blob or the CLI hands us something we cannot use.

use thiserror::Error;

/// Result type alias using [`DisruptionError`].
pub type Result<T> = std::result::Result<T, DisruptionError>;

/// Unified error type for all Disruption operations.
#[derive(Error, Debug)]
pub enum DisruptionError {
    // ============ Host Negotiation Errors ============
    /// Sample rate is zero, negative or not finite
    #[error("Invalid sample rate {sample_rate} Hz (must be finite and > 0)")]
    InvalidSampleRate { sample_rate: f64 },

    /// Maximum block size of zero
    #[error("Invalid maximum block size {block_size} (must be > 0)")]
    InvalidBlockSize { block_size: usize },

    /// Channel layout other than mono or stereo
    #[error("Unsupported channel layout with {channels} channel(s) (mono or stereo only)")]
    UnsupportedLayout { channels: usize },

    // ============ Persisted State Errors ============
    /// Saved state blob is shorter than the fixed layout
    #[error("Persisted state truncated: expected {expected} bytes, found {found}")]
    StateTruncated { expected: usize, found: usize },

    // ============ I/O Errors ============
    /// Error reading audio input
    #[error("Audio input error: {message}")]
    AudioInputError { message: String },

    /// Error writing audio output
    #[error("Audio output error: {message}")]
    AudioOutputError { message: String },
}

impl DisruptionError {
    /// Create an invalid sample rate error
    pub fn invalid_sample_rate(sample_rate: f64) -> Self {
        Self::InvalidSampleRate { sample_rate }
    }

    /// Create an unsupported layout error
    pub fn unsupported_layout(channels: usize) -> Self {
        Self::UnsupportedLayout { channels }
    }

    /// Create a truncated state error
    pub fn state_truncated(expected: usize, found: usize) -> Self {
        Self::StateTruncated { expected, found }
    }
}
