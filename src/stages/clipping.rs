//! Clipping stage: coupling capacitor into an anti-parallel diode pair.
//!
//! With C2 replaced by its trapezoidal companion (resistance `R2`, history
//! current `x2`), KCL at the diode node gives the implicit equation
//!
//! ```text
//! f(Vd) = −Vi/R2 + Is·sinh(Vd/(η·Vt)) + G·Vd − x2 = 0
//! ```
//!
//! which is solved each sample with a damped Newton-Raphson iteration. The
//! previous sample's solution seeds the next one, so a steady signal usually
//! needs zero to three iterations.
//!
//! The iteration budget is fixed. If it runs out, the best estimate so far is
//! used as-is. A proposed step is only accepted if it lowers `|f|`, so that
//! estimate is always finite.

use crate::circuit::{ClippingCoefficients, DiodeParams};

/// Residual threshold (amperes) below which the diode voltage is accepted.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-7;

/// Maximum Newton-Raphson iterations per sample.
pub const MAX_ITERATIONS: usize = 50;

/// Iteration statistics of the clipping solver.
///
/// Fixed-size, so recording from the audio thread never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceStats {
    /// `histogram[i]` counts samples that finished after `i` iterations
    histogram: [u64; MAX_ITERATIONS + 1],
    /// Samples that exhausted the budget with `|f|` still above threshold
    unconverged: u64,
}

impl Default for ConvergenceStats {
    fn default() -> Self {
        Self {
            histogram: [0; MAX_ITERATIONS + 1],
            unconverged: 0,
        }
    }
}

impl ConvergenceStats {
    fn record(&mut self, iterations: usize, converged: bool) {
        self.histogram[iterations.min(MAX_ITERATIONS)] += 1;
        if !converged {
            self.unconverged += 1;
        }
    }

    /// Per-iteration-count sample counts.
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// Total samples solved.
    pub fn samples(&self) -> u64 {
        self.histogram.iter().sum()
    }

    /// Samples that hit the iteration cap without converging.
    pub fn unconverged(&self) -> u64 {
        self.unconverged
    }

    /// Largest iteration count seen, if any sample was solved.
    pub fn max_iterations(&self) -> Option<usize> {
        self.histogram.iter().rposition(|&count| count > 0)
    }

    /// Mean iterations per sample.
    pub fn mean_iterations(&self) -> f64 {
        let samples = self.samples();
        if samples == 0 {
            return 0.0;
        }
        let total: u64 = self
            .histogram
            .iter()
            .enumerate()
            .map(|(i, &count)| i as u64 * count)
            .sum();
        total as f64 / samples as f64
    }

    /// Clear all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of one per-sample solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solve {
    /// Diode voltage estimate
    pub vd: f64,
    /// Iterations spent (accepted and rejected steps)
    pub iterations: usize,
    /// Whether `|f(vd)|` fell below the threshold
    pub converged: bool,
}

/// Damped Newton-Raphson solver for the diode clipper.
///
/// Holds the warm-start diode voltage, which carries over from one sample
/// to the next for the whole lifetime of the processor.
#[derive(Debug, Clone)]
pub struct ClippingStage {
    diode: DiodeParams,
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence threshold on |f|
    pub threshold: f64,
    /// Diode voltage estimate carried between samples
    vd: f64,
    stats: ConvergenceStats,
}

impl ClippingStage {
    /// Create a solver with the default budget and threshold.
    pub fn new(diode: DiodeParams) -> Self {
        Self::with_config(diode, MAX_ITERATIONS, CONVERGENCE_THRESHOLD)
    }

    /// Create a solver with a custom iteration budget and threshold.
    ///
    /// The budget is capped at [`MAX_ITERATIONS`].
    pub fn with_config(diode: DiodeParams, max_iterations: usize, threshold: f64) -> Self {
        Self {
            diode,
            max_iterations: max_iterations.min(MAX_ITERATIONS),
            threshold,
            vd: 0.0,
            stats: ConvergenceStats::default(),
        }
    }

    /// Current diode voltage estimate.
    pub fn diode_voltage(&self) -> f64 {
        self.vd
    }

    pub fn stats(&self) -> &ConvergenceStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Process one sample, updating `x2` in place; returns `level · Vd`.
    #[inline]
    pub fn process(&mut self, k: &ClippingCoefficients, vi: f64, x2: &mut f64, level: f64) -> f64 {
        let solve = self.solve(k, vi, *x2);
        self.stats.record(solve.iterations, solve.converged);

        *x2 = 2.0 * solve.vd / k.r2 - *x2;
        level * solve.vd
    }

    /// Run the damped Newton iteration from the warm-start estimate.
    pub fn solve(&mut self, k: &ClippingCoefficients, vi: f64, x2: f64) -> Solve {
        let n_vt = self.diode.n_vt();
        let residual = |v: f64| -vi / k.r2 + self.diode.is * (v / n_vt).sinh() + k.g * v - x2;

        let mut vd = self.vd;
        let mut f = residual(vd);
        let mut damping = 1.0;
        let mut slope = self.diode.conductance(vd) + k.g;
        let mut iterations = 0;

        while iterations < self.max_iterations && f.abs() > self.threshold {
            iterations += 1;

            let candidate = vd - damping * f / slope;
            let f_candidate = residual(candidate);

            if f_candidate.abs() < f.abs() {
                vd = candidate;
                f = f_candidate;
                damping = 1.0;
                slope = self.diode.conductance(vd) + k.g;
                if !slope.is_finite() {
                    break;
                }
            } else {
                // Overflowed sinh lands here too: |inf| < |f| is false
                damping *= 0.5;
            }
        }

        self.vd = vd;
        Solve {
            vd,
            iterations,
            converged: f.abs() <= self.threshold,
        }
    }
}
