//! Block processor: ties knobs, coefficients, stages and effects together.

use std::sync::Arc;

use log::{debug, info, warn};
use no_denormals::no_denormals;

use crate::circuit::{CircuitConstants, CoefficientManager, Coefficients};
use crate::controls::{
    level_scale, ParameterSnapshot, Parameters, SmoothedKnob, Tremolo, DEFAULT_KNOB,
    DEFAULT_TREMOLO_DEPTH,
};
use crate::effects::{Chorus, ChorusParams, LowPass, DEFAULT_CUTOFF};
use crate::error::Result;
use crate::stages::{
    ClippingStage, ConvergenceStats, DistortionStage, CONVERGENCE_THRESHOLD, MAX_ITERATIONS,
};
use crate::state::{PersistedState, STATE_SIZE};

use super::{ChannelLayout, ProcessSpec};

/// Magnitude below which per-channel memories are flushed to zero.
const DENORMAL_THRESHOLD: f64 = 1e-30;

/// Configuration for the processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum Newton-Raphson iterations per sample in the clipping stage.
    pub max_iterations: usize,
    /// Residual threshold for the clipping stage (amperes).
    pub tolerance: f64,
    /// Circuit component values.
    pub constants: CircuitConstants,
    /// Cutoff of the output low-pass in Hz.
    pub lowpass_cutoff: f64,
    /// Chorus settings used while the tremolo is on.
    pub chorus: ChorusParams,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: CONVERGENCE_THRESHOLD,
            constants: CircuitConstants::default(),
            lowpass_cutoff: DEFAULT_CUTOFF,
            chorus: ChorusParams::default(),
        }
    }
}

impl ProcessorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum Newton-Raphson iterations (capped at [`MAX_ITERATIONS`]).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the clipping solver's residual threshold.
    ///
    /// A looser threshold saves iterations on loud passages at the cost of a
    /// less exact diode voltage.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replace the circuit component values.
    pub fn with_constants(mut self, constants: CircuitConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Set the output low-pass cutoff in Hz.
    pub fn with_lowpass_cutoff(mut self, cutoff: f64) -> Self {
        self.lowpass_cutoff = cutoff;
        self
    }

    /// Replace the chorus settings.
    pub fn with_chorus(mut self, chorus: ChorusParams) -> Self {
        self.chorus = chorus;
        self
    }
}

/// History of one channel's two stages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    /// Distortion stage capacitor history (x1)
    pub distortion: f64,
    /// Clipping stage capacitor history (x2)
    pub clipping: f64,
}

impl ChannelState {
    fn flush_denormals(&mut self) {
        if self.distortion.abs() < DENORMAL_THRESHOLD {
            self.distortion = 0.0;
        }
        if self.clipping.abs() < DENORMAL_THRESHOLD {
            self.clipping = 0.0;
        }
    }
}

/// The pedal's real-time processor.
pub struct Processor {
    config: ProcessorConfig,
    /// Knob targets, shared with whoever drives the controls
    params: Arc<Parameters>,
    spec: ProcessSpec,
    layout: ChannelLayout,
    coefficients: CoefficientManager,
    drive: SmoothedKnob,
    /// Raw level target last applied, and its output scale
    level_target: f32,
    level: f64,
    clipping: ClippingStage,
    /// One state record per channel, indexed by channel
    channels: Vec<ChannelState>,
    tremolo: Tremolo,
    chorus: Chorus,
    lowpass: LowPass,
}

impl Processor {
    /// Create a processor prepared for the default spec (44.1 kHz stereo).
    pub fn new(config: ProcessorConfig) -> Self {
        let spec = ProcessSpec::default();
        let clipping = ClippingStage::with_config(
            config.constants.diode,
            config.max_iterations,
            config.tolerance,
        );

        let mut processor = Self {
            coefficients: CoefficientManager::new(config.constants, spec.sample_rate, 0.0),
            // The drive pot starts fully open and is smoothed up to its target
            drive: SmoothedKnob::with_target(0.0, f64::from(DEFAULT_KNOB)),
            level_target: DEFAULT_KNOB,
            level: level_scale(f64::from(DEFAULT_KNOB)),
            clipping,
            params: Arc::new(Parameters::new()),
            spec,
            layout: ChannelLayout::Stereo,
            channels: Vec::new(),
            tremolo: Tremolo::new(DEFAULT_TREMOLO_DEPTH),
            chorus: Chorus::new(config.chorus),
            lowpass: LowPass::new(config.lowpass_cutoff),
            config,
        };
        processor.apply_spec(spec, ChannelLayout::Stereo);
        processor
    }

    /// Renegotiate sample rate, block size and channel count.
    ///
    /// Coefficients are recomputed for the new rate. Channel memories are
    /// zeroed only if the channel count changed. Effect history and the
    /// tremolo phase always restart.
    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<()> {
        let layout = spec.validate().inspect_err(|e| warn!("rejected process spec: {e}"))?;
        self.apply_spec(spec, layout);
        Ok(())
    }

    fn apply_spec(&mut self, spec: ProcessSpec, layout: ChannelLayout) {
        self.coefficients.set_sample_rate(spec.sample_rate);

        if self.channels.len() != spec.channels {
            debug!(
                "channel count {} -> {}, resetting stage memories",
                self.channels.len(),
                spec.channels
            );
            self.channels = vec![ChannelState::default(); spec.channels];
        }

        self.chorus.prepare(spec.sample_rate, spec.channels);
        self.lowpass.prepare(spec.sample_rate, spec.channels);
        self.tremolo.reset();

        self.spec = spec;
        self.layout = layout;
        info!(
            "prepared: {} Hz, {:?}, max block {}",
            spec.sample_rate, layout, spec.max_block_size
        );
    }

    /// Handle for reading and writing the controls from another thread.
    pub fn parameters(&self) -> Arc<Parameters> {
        Arc::clone(&self.params)
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Coefficients the next block will use (before that block's knob refresh).
    pub fn coefficients(&self) -> &Coefficients {
        self.coefficients.coefficients()
    }

    pub fn drive_knob(&self) -> &SmoothedKnob {
        &self.drive
    }

    /// Current clipping-stage output scale.
    pub fn output_level(&self) -> f64 {
        self.level
    }

    pub fn channel_states(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Warm-start diode voltage carried into the next sample.
    pub fn diode_voltage(&self) -> f64 {
        self.clipping.diode_voltage()
    }

    pub fn convergence_stats(&self) -> &ConvergenceStats {
        self.clipping.stats()
    }

    pub fn reset_convergence_stats(&mut self) {
        self.clipping.reset_stats();
    }

    pub fn tremolo_phase(&self) -> f64 {
        self.tremolo.phase()
    }

    /// Serialize the persisted subset of the controls.
    pub fn save_state(&self) -> [u8; STATE_SIZE] {
        PersistedState::capture(&self.params).to_bytes()
    }

    /// Restore controls from a blob written by [`Processor::save_state`].
    pub fn load_state(&self, bytes: &[u8]) -> Result<()> {
        let state = PersistedState::from_bytes(bytes)
            .inspect_err(|e| warn!("ignoring saved state: {e}"))?;
        debug!("restoring {state:?}");
        state.apply(&self.params);
        Ok(())
    }

    /// Process one block in place, one slice per channel.
    ///
    /// Knob smoothing and the coefficient refresh happen once, before any
    /// sample is touched; every sample of the block then sees the same
    /// coefficient snapshot.
    pub fn process_block(&mut self, buffer: &mut [&mut [f32]]) {
        let snapshot = self.params.snapshot();
        self.refresh(&snapshot);

        if snapshot.bypass {
            return;
        }

        no_denormals(|| self.render(buffer, &snapshot));
    }

    /// Advance knob smoothing and refresh whatever coefficients it touched.
    fn refresh(&mut self, snapshot: &ParameterSnapshot) {
        self.drive.set_target(f64::from(snapshot.drive));
        if self.drive.step() {
            self.coefficients.set_pot_position(self.drive.smoothed());
        }

        if snapshot.level != self.level_target {
            self.level_target = snapshot.level;
            self.level = level_scale(f64::from(snapshot.level));
        }
    }

    fn render(&mut self, buffer: &mut [&mut [f32]], snapshot: &ParameterSnapshot) {
        let k = *self.coefficients.coefficients();
        let level = self.level;
        let clipping = &mut self.clipping;

        let increment = Tremolo::increment(f64::from(snapshot.tremolo_rate), self.spec.sample_rate);
        let block_start = self.tremolo;
        let mut block_end = block_start;

        for (state, samples) in self.channels.iter_mut().zip(buffer.iter_mut()) {
            // Every channel runs the tremolo from the same phase
            let mut tremolo = block_start;

            for sample in samples.iter_mut() {
                let vi = f64::from(*sample);
                let vo = DistortionStage::process(&k.distortion, vi, &mut state.distortion);
                let mut out = clipping.process(&k.clipping, vo, &mut state.clipping, level);

                if snapshot.tremolo_on {
                    out *= tremolo.tick(increment);
                }

                *sample = out as f32;
            }

            state.flush_denormals();
            block_end = tremolo;
        }
        self.tremolo = block_end;

        // Channels beyond the negotiated layout carry no signal
        for samples in buffer.iter_mut().skip(self.channels.len()) {
            samples.fill(0.0);
        }

        if snapshot.tremolo_on {
            self.chorus.process(buffer);
        }
        self.lowpass.process(buffer);
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DisruptionError;
    use approx::assert_relative_eq;

    fn mono(sample_rate: f64) -> Processor {
        let mut p = Processor::default();
        p.prepare(ProcessSpec::new(sample_rate, 64, 1)).unwrap();
        p
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut p = Processor::default();
        p.parameters().set_drive(1.0);
        p.parameters().set_level(1.0);

        let mut left = [0.0f32; 64];
        let mut right = [0.0f32; 64];
        for _ in 0..20 {
            p.process_block(&mut [&mut left[..], &mut right[..]]);
        }

        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        assert!(p.channel_states().iter().all(|s| *s == ChannelState::default()));
        assert_eq!(p.diode_voltage(), 0.0);
    }

    #[test]
    fn test_drive_smooths_once_per_block() {
        let mut p = mono(44100.0);
        assert_eq!(p.drive_knob().smoothed(), 0.0);
        assert_relative_eq!(p.coefficients().distortion.rp, 1e6);

        let mut block = [0.0f32; 64];
        p.process_block(&mut [&mut block[..]]);
        assert_relative_eq!(p.drive_knob().smoothed(), 0.05);
        assert_relative_eq!(p.coefficients().distortion.rp, 9.5e5, max_relative = 1e-12);

        p.process_block(&mut [&mut block[..]]);
        assert_relative_eq!(p.drive_knob().smoothed(), 0.095);

        // Knob coefficients track the smoothed position exactly
        let position = p.drive_knob().smoothed();
        let expected = CoefficientManager::new(CircuitConstants::default(), 44100.0, position);
        assert_eq!(p.coefficients(), expected.coefficients());
    }

    #[test]
    fn test_level_mapping_applied_at_block_start() {
        let mut p = mono(44100.0);
        p.parameters().set_level(0.0);
        let mut block = [0.0f32; 8];
        p.process_block(&mut [&mut block[..]]);
        assert_relative_eq!(p.output_level(), crate::controls::LEVEL_EPSILON);
    }

    #[test]
    fn test_bypass_leaves_block_dry() {
        let mut p = mono(48000.0);
        p.parameters().set_bypass(true);

        let input: Vec<f32> = (0..64).map(|n| (n as f32 * 0.1).sin()).collect();
        let mut block = input.clone();
        p.process_block(&mut [&mut block[..]]);

        assert_eq!(block, input);
        assert_eq!(p.channel_states()[0], ChannelState::default());
        // The knob still moved toward its target
        assert!(p.drive_knob().smoothed() > 0.0);
    }

    #[test]
    fn test_state_persists_across_blocks_and_prepare() {
        let mut p = mono(44100.0);
        let mut block = [0.5f32; 64];
        p.process_block(&mut [&mut block[..]]);
        let after_first = p.channel_states()[0];
        assert_ne!(after_first, ChannelState::default());

        // Same channel count: memories survive renegotiation
        p.prepare(ProcessSpec::new(48000.0, 128, 1)).unwrap();
        assert_eq!(p.channel_states()[0], after_first);

        // New channel count: memories restart from zero
        p.prepare(ProcessSpec::new(48000.0, 128, 2)).unwrap();
        assert_eq!(p.channel_states(), &[ChannelState::default(); 2]);
    }

    #[test]
    fn test_rejected_spec_keeps_previous() {
        let mut p = mono(44100.0);
        let before = *p.coefficients();

        assert!(matches!(
            p.prepare(ProcessSpec::new(0.0, 64, 1)),
            Err(DisruptionError::InvalidSampleRate { .. })
        ));
        assert!(matches!(
            p.prepare(ProcessSpec::new(44100.0, 64, 4)),
            Err(DisruptionError::UnsupportedLayout { channels: 4 })
        ));
        assert_eq!(*p.coefficients(), before);
        assert_eq!(p.layout(), ChannelLayout::Mono);
    }

    #[test]
    fn test_prepare_accepts_very_low_sample_rate() {
        let mut p = Processor::default();
        p.prepare(ProcessSpec::new(20.0, 64, 1)).unwrap();
        assert_eq!(p.spec().sample_rate, 20.0);

        let mut block = [0.25f32; 64];
        p.process_block(&mut [&mut block[..]]);
        assert!(block.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_tremolo_phase_advances_by_block_length() {
        let mut p = Processor::default();
        p.parameters().set_tremolo_on(true);
        p.parameters().set_tremolo_rate(4.0);

        let mut left = [0.1f32; 441];
        let mut right = [0.1f32; 441];
        p.process_block(&mut [&mut left[..], &mut right[..]]);

        // 441 samples at 44.1 kHz is 10 ms: 4 Hz covers 0.04 cycles, once for both channels
        assert_relative_eq!(p.tremolo_phase(), 0.04, max_relative = 1e-9);
    }

    #[test]
    fn test_convergence_stats_count_every_sample() {
        let mut p = Processor::default();
        let mut left = [0.3f32; 32];
        let mut right = [0.3f32; 32];
        p.process_block(&mut [&mut left[..], &mut right[..]]);
        assert_eq!(p.convergence_stats().samples(), 64);

        p.reset_convergence_stats();
        assert_eq!(p.convergence_stats().samples(), 0);
        assert_eq!(p.convergence_stats().max_iterations(), None);
    }

    #[test]
    fn test_tremolo_off_leaves_phase() {
        let mut p = mono(44100.0);
        let mut block = [0.1f32; 256];
        p.process_block(&mut [&mut block[..]]);
        assert_eq!(p.tremolo_phase(), 0.0);
    }

    #[test]
    fn test_extra_channels_are_cleared() {
        let mut p = mono(44100.0);
        let mut first = [0.0f32; 16];
        let mut extra = [1.0f32; 16];
        p.process_block(&mut [&mut first[..], &mut extra[..]]);
        assert!(extra.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_save_and_load_state() {
        let p = Processor::default();
        p.parameters().set_tremolo_rate(3.5);
        p.parameters().set_tremolo_on(true);
        let blob = p.save_state();

        let q = Processor::default();
        q.load_state(&blob).unwrap();
        assert_eq!(q.parameters().tremolo_rate(), 3.5);
        assert!(q.parameters().tremolo_on());

        assert!(q.load_state(&blob[..2]).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ProcessorConfig::new()
            .with_max_iterations(20)
            .with_tolerance(1e-6)
            .with_lowpass_cutoff(8000.0);
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.lowpass_cutoff, 8000.0);

        let p = Processor::new(config);
        assert_eq!(p.config().max_iterations, 20);
    }
}
