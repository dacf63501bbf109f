//! Fixed second-order low-pass that runs last on every block.
//!
//! Topology-preserving-transform state-variable filter: the bilinear
//! transform of a Butterworth low-pass with cutoff prewarping, one pair of
//! integrator states per channel.

/// Default cutoff in Hz.
pub const DEFAULT_CUTOFF: f64 = 5000.0;

/// Butterworth quality factor.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SvfCoefficients {
    a1: f32,
    a2: f32,
    a3: f32,
}

impl SvfCoefficients {
    fn lowpass(sample_rate: f64, cutoff: f64, q: f64) -> Self {
        // Keep below Nyquist; at very low rates the floor yields to the ceiling
        let ceiling = 0.45 * sample_rate;
        let cutoff = cutoff.min(ceiling).max(ceiling.min(10.0));
        let g = (std::f64::consts::PI * cutoff / sample_rate).tan();
        let k = 1.0 / q.max(0.05);
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;
        Self {
            a1: a1 as f32,
            a2: a2 as f32,
            a3: a3 as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SvfState {
    ic1eq: f32,
    ic2eq: f32,
}

impl SvfState {
    #[inline]
    fn process(&mut self, k: &SvfCoefficients, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = k.a1 * self.ic1eq + k.a2 * v3;
        let v2 = self.ic2eq + k.a2 * self.ic1eq + k.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }
}

/// Multichannel fixed low-pass filter.
#[derive(Debug, Clone)]
pub struct LowPass {
    cutoff: f64,
    coefficients: SvfCoefficients,
    states: Vec<SvfState>,
}

impl LowPass {
    /// Create an unprepared filter at `cutoff` Hz.
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff,
            coefficients: SvfCoefficients::default(),
            states: Vec::new(),
        }
    }

    /// Derive coefficients for `sample_rate` and allocate cleared per-channel state.
    pub fn prepare(&mut self, sample_rate: f64, channels: usize) {
        self.coefficients = SvfCoefficients::lowpass(sample_rate, self.cutoff, BUTTERWORTH_Q);
        self.states = vec![SvfState::default(); channels];
    }

    pub fn reset(&mut self) {
        self.states.fill(SvfState::default());
    }

    /// Filter every channel in place.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        let k = self.coefficients;
        for (state, samples) in self.states.iter_mut().zip(channels.iter_mut()) {
            for sample in samples.iter_mut() {
                *sample = state.process(&k, *sample);
            }
        }
    }
}
