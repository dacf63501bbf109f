//! # Disruption Core
//!
//! The real-time DSP core of a diode-clipping distortion pedal.
//!
//! This library provides:
//! - A discretized model of an op-amp RC distortion stage with rail clipping
//! - An anti-parallel diode clipper solved per sample by damped Newton-Raphson
//! - Knob smoothing and coefficient refresh tied to the audio block cadence
//! - A square-wave tremolo, chorus and fixed low-pass on the output
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Component values and the conductances derived from them
//! - [`stages`] - Per-sample distortion and clipping stages
//! - [`controls`] - Knob targets, smoothing, level scaling and tremolo
//! - [`effects`] - Block-level chorus and low-pass
//! - [`processor`] - Block orchestration and per-channel state
//! - [`state`] - Persisted plugin state
//! - [`audio`] - Raw PCM stream I/O (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 2 -ar 44100 - | disruption --channels 2 --drive 0.8 | ffmpeg -f f32le -ac 2 -ar 44100 -i - output.wav
//! ```
//!
//! ### Library
//!
//! ```
//! use disruption_core::{ProcessSpec, Processor};
//!
//! let mut processor = Processor::default();
//! processor.prepare(ProcessSpec::new(48000.0, 256, 1)).unwrap();
//! processor.parameters().set_drive(0.8);
//!
//! let mut block = vec![0.0f32; 256];
//! processor.process_block(&mut [&mut block[..]]);
//! ```
//!
//! ## Discretization
//!
//! Both stages replace their capacitor with a trapezoidal companion model:
//! a resistance `Ts / 2C` in parallel with a history current that is
//! updated after every sample. The distortion stage is then linear and
//! solved in closed form. The clipping stage leaves one implicit equation in
//! the diode voltage.

pub mod circuit;
pub mod controls;
pub mod effects;
pub mod error;
pub mod processor;
pub mod stages;
pub mod state;

#[cfg(feature = "cli")]
pub mod audio;

// Re-export main types for convenience
pub use controls::Parameters;
pub use error::{DisruptionError, Result};
pub use processor::{ProcessSpec, Processor, ProcessorConfig};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmDisruption;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Thermal voltage of the clipping diodes (26 mV)
pub const THERMAL_VOLTAGE: f64 = 26e-3;
