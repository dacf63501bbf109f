//! Knob smoothing and output level scaling.

/// Fraction of the remaining distance covered per smoothing step.
pub const SMOOTHING_FACTOR: f64 = 0.1;

/// Distance below which the smoothed value snaps onto the target.
///
/// Without it the geometric approach stalls a few ulps short of the target and
/// the drive coefficients would be recomputed on every block forever.
pub const SNAP_DISTANCE: f64 = 1e-9;

/// Offset keeping the output level away from exactly 0 and exactly 1.
pub const LEVEL_EPSILON: f64 = 1e-5;

/// A knob whose smoothed value chases its target once per audio block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedKnob {
    target: f64,
    smoothed: f64,
}

impl SmoothedKnob {
    /// Create a knob at rest on `initial`.
    pub fn new(initial: f64) -> Self {
        let v = initial.clamp(0.0, 1.0);
        Self {
            target: v,
            smoothed: v,
        }
    }

    /// Create a knob whose smoothed value starts at `smoothed` and heads for `target`.
    pub fn with_target(smoothed: f64, target: f64) -> Self {
        Self {
            target: target.clamp(0.0, 1.0),
            smoothed: smoothed.clamp(0.0, 1.0),
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    /// Set a new target in [0, 1]; NaN leaves the target unchanged.
    pub fn set_target(&mut self, target: f64) {
        if !target.is_nan() {
            self.target = target.clamp(0.0, 1.0);
        }
    }

    /// Whether the smoothed value has reached the target.
    pub fn is_settled(&self) -> bool {
        self.smoothed == self.target
    }

    /// Advance one block: `smoothed += α·(target − smoothed)`.
    ///
    /// Returns `true` if the smoothed value moved.
    pub fn step(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }

        let remaining = self.target - self.smoothed;
        if remaining.abs() <= SNAP_DISTANCE {
            self.smoothed = self.target;
        } else {
            self.smoothed += SMOOTHING_FACTOR * remaining;
        }
        true
    }
}

/// Map a raw output-level target in [0, 1] to the clipping output scale.
///
/// `level = ε + (1 − 2ε)·target`, so the scale is never exactly 0 or 1.
#[inline]
pub fn level_scale(target: f64) -> f64 {
    LEVEL_EPSILON + (1.0 - 2.0 * LEVEL_EPSILON) * target.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_smoothing_is_monotonic_without_overshoot() {
        let mut knob = SmoothedKnob::with_target(0.0, 1.0);
        let mut previous = knob.smoothed();

        for _ in 0..50 {
            assert!(knob.step());
            assert!(knob.smoothed() > previous);
            assert!(knob.smoothed() <= 1.0);
            previous = knob.smoothed();
        }

        // Geometric approach: remaining distance is 0.9^n
        assert_relative_eq!(1.0 - knob.smoothed(), 0.9f64.powi(50), max_relative = 1e-9);

        for _ in 50..88 {
            knob.step();
        }
        assert_abs_diff_eq!(knob.smoothed(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_smoothing_settles_and_goes_idle() {
        let mut knob = SmoothedKnob::with_target(0.0, 1.0);
        let mut steps = 0;
        while knob.step() {
            steps += 1;
            assert!(steps < 1000, "smoothing never settled");
        }
        assert_eq!(knob.smoothed(), 1.0);
        assert!(knob.is_settled());
        assert!(!knob.step());
    }

    #[test]
    fn test_smoothing_downwards() {
        let mut knob = SmoothedKnob::with_target(0.8, 0.2);
        knob.step();
        assert_relative_eq!(knob.smoothed(), 0.74);
        while knob.step() {
            assert!(knob.smoothed() >= 0.2);
        }
        assert_eq!(knob.smoothed(), 0.2);
    }

    #[test]
    fn test_targets_are_clamped() {
        let mut knob = SmoothedKnob::new(0.5);
        assert!(!knob.step());

        knob.set_target(3.0);
        assert_eq!(knob.target(), 1.0);
        knob.set_target(f64::NAN);
        assert_eq!(knob.target(), 1.0);
        knob.set_target(-1.0);
        assert_eq!(knob.target(), 0.0);
    }

    #[test]
    fn test_level_scale_avoids_extremes() {
        assert_eq!(level_scale(0.0), LEVEL_EPSILON);
        assert_relative_eq!(level_scale(1.0), 1.0 - LEVEL_EPSILON);
        assert_relative_eq!(level_scale(0.5), 0.5);
        assert!(level_scale(0.0) > 0.0);
        assert!(level_scale(1.0) < 1.0);
    }
}
