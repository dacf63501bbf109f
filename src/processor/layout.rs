//! Host negotiation: processing spec and supported channel layouts.

use crate::error::{DisruptionError, Result};
use crate::DEFAULT_SAMPLE_RATE;

/// Default maximum block size in samples.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Supported bus layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Accept one or two channels; anything else is rejected.
    pub fn from_channel_count(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            n => Err(DisruptionError::unsupported_layout(n)),
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// What the host tells us when processing (re)starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block the host will hand to one process call
    pub max_block_size: usize,
    /// Number of channels processed in place
    pub channels: usize,
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: f64::from(DEFAULT_SAMPLE_RATE),
            max_block_size: DEFAULT_BLOCK_SIZE,
            channels: ChannelLayout::Stereo.channels(),
        }
    }
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, max_block_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels,
        }
    }

    /// Validate the negotiated settings and resolve the channel layout.
    pub fn validate(&self) -> Result<ChannelLayout> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(DisruptionError::invalid_sample_rate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(DisruptionError::InvalidBlockSize {
                block_size: self.max_block_size,
            });
        }
        ChannelLayout::from_channel_count(self.channels)
    }
}
