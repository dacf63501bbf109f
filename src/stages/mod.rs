//! Per-sample circuit stages.
//!
//! Both stages read a [`Coefficients`](crate::circuit::Coefficients) snapshot
//! and mutate a single history scalar owned by the caller's per-channel
//! state:
//!
//! - [`DistortionStage`] - linear RC gain stage with rail clipping
//! - [`ClippingStage`] - diode clipper solved by damped Newton-Raphson

mod clipping;
mod distortion;

pub use clipping::{ClippingStage, ConvergenceStats, Solve, CONVERGENCE_THRESHOLD, MAX_ITERATIONS};
pub use distortion::DistortionStage;
