//! Derived conductances for both stages.
//!
//! Capacitors are replaced by their trapezoidal companion resistance
//! `R = Ts / (2C)`, which makes each stage a division-free linear update in
//! terms of the grouped conductances below.

use super::CircuitConstants;

/// Grouped resistances of the distortion stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistortionCoefficients {
    /// Companion resistance of C1
    pub r1: f64,
    /// Present drive pot resistance
    pub rp: f64,
    /// `1 / (R1 + R3 + Rp)`
    pub g: f64,
    /// `(R3 + Rp) · G`
    pub gb: f64,
    /// `1 + R4 · G`
    pub gi: f64,
    /// `R1 · R4 · G`
    pub gx1: f64,
}

/// Grouped resistances of the clipping stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClippingCoefficients {
    /// Companion resistance of C2
    pub r2: f64,
    /// `1/R5 + 1/R2`
    pub g: f64,
}

/// A consistent snapshot of every derived coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coefficients {
    /// Sampling period (1/sample_rate)
    pub ts: f64,
    pub distortion: DistortionCoefficients,
    pub clipping: ClippingCoefficients,
}

/// Translates (sample rate, drive position) into stage coefficients.
#[derive(Debug, Clone)]
pub struct CoefficientManager {
    constants: CircuitConstants,
    sample_rate: f64,
    pot_position: f64,
    coefficients: Coefficients,
}

impl CoefficientManager {
    /// Create a manager with the pot at `pot_position` and all coefficients
    /// derived for `sample_rate`.
    ///
    /// `sample_rate` must be finite and positive; [`crate::Processor::prepare`]
    /// rejects anything else before it gets here.
    pub fn new(constants: CircuitConstants, sample_rate: f64, pot_position: f64) -> Self {
        let mut manager = Self {
            constants,
            sample_rate,
            pot_position,
            coefficients: Coefficients::default(),
        };
        manager.refresh_all();
        manager
    }

    /// Current coefficient snapshot.
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn constants(&self) -> &CircuitConstants {
        &self.constants
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Apply a new sample rate, recomputing both stages from scratch.
    ///
    /// Returns `true` if the rate differed from the last one applied.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> bool {
        debug_assert!(sample_rate.is_finite() && sample_rate > 0.0);
        if sample_rate == self.sample_rate {
            return false;
        }
        self.sample_rate = sample_rate;
        self.refresh_all();
        true
    }

    /// Apply a new smoothed drive position; only the distortion stage depends on it.
    ///
    /// Returns `true` if the position differed from the last one applied.
    pub fn set_pot_position(&mut self, position: f64) -> bool {
        if position == self.pot_position {
            return false;
        }
        self.pot_position = position;
        self.refresh_distortion();
        true
    }

    /// Recompute the sampling period and both stages.
    pub fn refresh_all(&mut self) {
        self.coefficients.ts = 1.0 / self.sample_rate;
        self.refresh_distortion();
        self.refresh_clipping();
    }

    fn refresh_distortion(&mut self) {
        let c = &self.constants;
        let r1 = self.coefficients.ts / (2.0 * c.c1);
        let rp = c.pot_resistance(self.pot_position);
        let g = 1.0 / (r1 + c.r3 + rp);

        self.coefficients.distortion = DistortionCoefficients {
            r1,
            rp,
            g,
            gb: (c.r3 + rp) * g,
            gi: 1.0 + c.r4 * g,
            gx1: r1 * c.r4 * g,
        };
    }

    fn refresh_clipping(&mut self) {
        let c = &self.constants;
        let r2 = self.coefficients.ts / (2.0 * c.c2);

        self.coefficients.clipping = ClippingCoefficients {
            r2,
            g: 1.0 / c.r5 + 1.0 / r2,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_companion_resistances() {
        let m = CoefficientManager::new(CircuitConstants::default(), 44100.0, 0.5);
        let k = m.coefficients();

        assert_relative_eq!(k.ts, 1.0 / 44100.0);
        // R1 = Ts / (2 * 47nF)
        assert_relative_eq!(k.distortion.r1, 241.231_244_270_757_97, max_relative = 1e-12);
        // R2 = Ts / (2 * 1nF)
        assert_relative_eq!(k.clipping.r2, 11_337.868_480_725_62, max_relative = 1e-12);
        assert_relative_eq!(k.distortion.rp, 5e5);
        assert_relative_eq!(k.clipping.g, 1e-4 + 1.0 / k.clipping.r2);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut m = CoefficientManager::new(CircuitConstants::default(), 48000.0, 0.37);
        let first = *m.coefficients();
        m.refresh_all();
        m.refresh_all();
        let second = *m.coefficients();

        assert_eq!(first.ts.to_bits(), second.ts.to_bits());
        assert_eq!(first.distortion.g.to_bits(), second.distortion.g.to_bits());
        assert_eq!(first.distortion.gb.to_bits(), second.distortion.gb.to_bits());
        assert_eq!(first.distortion.gi.to_bits(), second.distortion.gi.to_bits());
        assert_eq!(first.distortion.gx1.to_bits(), second.distortion.gx1.to_bits());
        assert_eq!(first.clipping.g.to_bits(), second.clipping.g.to_bits());
    }

    #[test]
    fn test_pot_change_leaves_clipping_alone() {
        let mut m = CoefficientManager::new(CircuitConstants::default(), 44100.0, 0.0);
        let before = *m.coefficients();

        assert!(m.set_pot_position(0.8));
        let after = *m.coefficients();

        assert_eq!(before.clipping, after.clipping);
        assert_eq!(before.ts, after.ts);
        assert_ne!(before.distortion.g, after.distortion.g);
        assert_relative_eq!(after.distortion.rp, 2e5, max_relative = 1e-12);

        // Same position again is a no-op
        assert!(!m.set_pot_position(0.8));
    }

    #[test]
    fn test_sample_rate_change_matches_fresh_manager() {
        let mut m = CoefficientManager::new(CircuitConstants::default(), 44100.0, 0.25);
        assert!(m.set_sample_rate(96000.0));
        assert!(!m.set_sample_rate(96000.0));

        assert_eq!(m.sample_rate(), 96000.0);

        let fresh = CoefficientManager::new(*m.constants(), 96000.0, 0.25);
        assert_eq!(m.coefficients(), fresh.coefficients());
    }
}
