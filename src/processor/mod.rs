//! Block processing.
//!
//! For each audio block the [`Processor`]:
//!
//! 1. Takes one snapshot of the knob targets
//! 2. Smooths the drive knob and refreshes the coefficients it affects
//! 3. Runs every channel sample by sample: distortion stage, clipping
//!    stage, then the tremolo gain if engaged
//! 4. Runs the chorus (with the tremolo) and the low-pass over the buffer
//!
//! Coefficients are only written in step 2, so the per-sample loop reads a
//! single consistent snapshot.

mod block;
mod layout;

pub use block::{ChannelState, Processor, ProcessorConfig};
pub use layout::{ChannelLayout, ProcessSpec, DEFAULT_BLOCK_SIZE};
