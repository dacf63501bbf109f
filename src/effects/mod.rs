//! Block-level effects run after the per-sample circuit stages.
//!
//! - [`Chorus`] - modulated delay, engaged together with the tremolo
//! - [`LowPass`] - fixed 5 kHz Butterworth low-pass, always last

mod chorus;
mod lowpass;

pub use chorus::{Chorus, ChorusParams};
pub use lowpass::{LowPass, BUTTERWORTH_Q, DEFAULT_CUTOFF};
