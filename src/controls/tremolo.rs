//! Square-wave tremolo applied after the clipping stage.
//!
//! The LFO is a phase accumulator in cycles: the gain is 1.0 for the first
//! half of each cycle and `1 − 2·depth` for the second half.

/// Default modulation depth.
pub const DEFAULT_DEPTH: f64 = 0.3;

/// Square-wave gain modulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tremolo {
    /// Current phase (0.0 to 1.0)
    phase: f64,
    /// Modulation depth (0.0 to 0.5)
    depth: f64,
}

impl Default for Tremolo {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl Tremolo {
    /// Create a tremolo at phase zero.
    pub fn new(depth: f64) -> Self {
        Self {
            phase: 0.0,
            depth: depth.clamp(0.0, 0.5),
        }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Gain at the current phase, without advancing.
    #[inline]
    pub fn gain(&self) -> f64 {
        // Square LFO: +1 while sin(2π·phase) >= 0, -1 otherwise
        let lfo = if self.phase < 0.5 { 1.0 } else { -1.0 };
        1.0 - self.depth * (1.0 - lfo)
    }

    /// Return the gain for this sample and advance by `increment` cycles.
    #[inline]
    pub fn tick(&mut self, increment: f64) -> f64 {
        let gain = self.gain();

        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        gain
    }

    /// Phase increment per sample for a rate in Hz.
    #[inline]
    pub fn increment(rate_hz: f64, sample_rate: f64) -> f64 {
        rate_hz / sample_rate
    }

    /// Reset the phase to the start of a cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_square_gain_levels() {
        // 1 Hz at 4 samples/sec: phases 0, 0.25, 0.5, 0.75
        let mut t = Tremolo::default();
        let inc = Tremolo::increment(1.0, 4.0);

        assert_eq!(t.tick(inc), 1.0);
        assert_eq!(t.tick(inc), 1.0);
        assert_relative_eq!(t.tick(inc), 0.4);
        assert_relative_eq!(t.tick(inc), 0.4);

        // Wrapped back to the top of the cycle
        assert_eq!(t.phase(), 0.0);
        assert_eq!(t.tick(inc), 1.0);
    }

    #[test]
    fn test_phase_stays_in_one_cycle() {
        let mut t = Tremolo::default();
        let inc = Tremolo::increment(7.3, 44100.0);
        for _ in 0..100_000 {
            t.tick(inc);
            assert!((0.0..1.0).contains(&t.phase()));
        }

        // Increments larger than a cycle still wrap
        t.tick(2.5);
        assert!((0.0..1.0).contains(&t.phase()));
    }

    #[test]
    fn test_reset() {
        let mut t = Tremolo::new(0.9);
        assert_eq!(t.depth(), 0.5);
        t.tick(0.6);
        assert_eq!(t.gain(), 0.0);
        t.reset();
        assert_eq!(t.phase(), 0.0);
        assert_eq!(t.gain(), 1.0);
    }
}
