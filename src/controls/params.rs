//! Knob targets shared between the UI thread and the audio thread.
//!
//! Every field is a single atomic, so writers never block the audio thread and
//! the processor picks up whatever was last written at the start of its next
//! block.

use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

/// Default drive and level knob position.
pub const DEFAULT_KNOB: f32 = 0.5;

/// Default tremolo rate in Hz.
pub const DEFAULT_TREMOLO_RATE: f32 = 2.0;

/// Tremolo rate range exposed by the pedal's rate knob.
pub const TREMOLO_RATE_RANGE: (f32, f32) = (0.1, 10.0);

/// User-facing controls of the pedal.
#[derive(Debug)]
pub struct Parameters {
    drive: AtomicF32,
    level: AtomicF32,
    bypass: AtomicBool,
    tremolo_rate: AtomicF32,
    tremolo_on: AtomicBool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            drive: AtomicF32::new(DEFAULT_KNOB),
            level: AtomicF32::new(DEFAULT_KNOB),
            bypass: AtomicBool::new(false),
            tremolo_rate: AtomicF32::new(DEFAULT_TREMOLO_RATE),
            tremolo_on: AtomicBool::new(false),
        }
    }
}

/// A plain copy of every control, taken once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub drive: f32,
    pub level: f32,
    pub bypass: bool,
    pub tremolo_rate: f32,
    pub tremolo_on: bool,
}

fn clamp_knob(value: f32) -> Option<f32> {
    (!value.is_nan()).then(|| value.clamp(0.0, 1.0))
}

impl Parameters {
    /// Create parameters at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drive knob target; clamped to [0, 1], NaN ignored.
    pub fn set_drive(&self, value: f32) {
        if let Some(v) = clamp_knob(value) {
            self.drive.store(v, Ordering::Relaxed);
        }
    }

    pub fn drive(&self) -> f32 {
        self.drive.load(Ordering::Relaxed)
    }

    /// Set the output level knob target; clamped to [0, 1], NaN ignored.
    pub fn set_level(&self, value: f32) {
        if let Some(v) = clamp_knob(value) {
            self.level.store(v, Ordering::Relaxed);
        }
    }

    pub fn level(&self) -> f32 {
        self.level.load(Ordering::Relaxed)
    }

    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    pub fn bypass(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    /// Set the tremolo rate in Hz, clamped to [`TREMOLO_RATE_RANGE`].
    pub fn set_tremolo_rate(&self, hz: f32) {
        if hz.is_finite() {
            let (lo, hi) = TREMOLO_RATE_RANGE;
            self.tremolo_rate.store(hz.clamp(lo, hi), Ordering::Relaxed);
        }
    }

    pub fn tremolo_rate(&self) -> f32 {
        self.tremolo_rate.load(Ordering::Relaxed)
    }

    pub fn set_tremolo_on(&self, on: bool) {
        self.tremolo_on.store(on, Ordering::Relaxed);
    }

    pub fn tremolo_on(&self) -> bool {
        self.tremolo_on.load(Ordering::Relaxed)
    }

    /// Read every control once.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            drive: self.drive(),
            level: self.level(),
            bypass: self.bypass(),
            tremolo_rate: self.tremolo_rate(),
            tremolo_on: self.tremolo_on(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults() {
        let p = Parameters::new();
        let s = p.snapshot();
        assert_eq!(s.drive, 0.5);
        assert_eq!(s.level, 0.5);
        assert!(!s.bypass);
        assert_eq!(s.tremolo_rate, 2.0);
        assert!(!s.tremolo_on);
    }

    #[test]
    fn test_values_are_clamped() {
        let p = Parameters::new();
        p.set_drive(1.7);
        p.set_level(-0.2);
        p.set_tremolo_rate(50.0);
        assert_eq!(p.drive(), 1.0);
        assert_eq!(p.level(), 0.0);
        assert_eq!(p.tremolo_rate(), 10.0);

        p.set_drive(f32::NAN);
        p.set_tremolo_rate(f32::INFINITY);
        assert_eq!(p.drive(), 1.0);
        assert_eq!(p.tremolo_rate(), 10.0);
    }

    #[test]
    fn test_writes_from_another_thread_are_visible() {
        let p = Arc::new(Parameters::new());
        let ui = Arc::clone(&p);

        thread::spawn(move || {
            ui.set_drive(0.9);
            ui.set_tremolo_on(true);
        })
        .join()
        .unwrap();

        assert_eq!(p.drive(), 0.9);
        assert!(p.tremolo_on());
    }
}
