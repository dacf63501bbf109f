//! Chorus run over the whole buffer while the tremolo is engaged.
//!
//! Each channel owns a ring buffer read at a sine-modulated fractional delay
//! around a short centre delay. All channels share one LFO so the stereo image
//! stays put. Buffers are sized in [`Chorus::prepare`] and never grow on the
//! audio thread.

use std::f64::consts::TAU;

/// Delay swing in milliseconds at full depth.
const MAX_DELAY_MODULATION_MS: f64 = 20.0;

/// Scale applied to depth before it reaches the delay swing.
const DEPTH_SCALE: f64 = 0.5;

/// Chorus settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusParams {
    /// LFO rate in Hz
    pub rate: f64,
    /// Modulation depth (0.0 to 1.0)
    pub depth: f64,
    /// Centre delay in milliseconds
    pub centre_delay_ms: f64,
    /// Feedback amount (0.0 to 0.95)
    pub feedback: f32,
    /// Dry/wet mix (0.0 = dry only, 1.0 = wet only)
    pub mix: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate: 0.5,
            depth: 0.2,
            centre_delay_ms: 3.0,
            feedback: 0.2,
            mix: 0.3,
        }
    }
}

impl ChorusParams {
    /// Delay swing either side of the centre, in milliseconds.
    fn swing_ms(&self) -> f64 {
        MAX_DELAY_MODULATION_MS * DEPTH_SCALE * self.depth
    }

    /// Longest delay the LFO can reach, in milliseconds.
    fn max_delay_ms(&self) -> f64 {
        self.centre_delay_ms + self.swing_ms()
    }
}

/// A single-channel ring buffer with a fractional read tap.
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(2)],
            write_pos: 0,
        }
    }

    /// Read `delay` samples behind the write head, then write `input + feedback·wet`.
    #[inline]
    fn process(&mut self, input: f32, delay: f64, feedback: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1.0, (len - 1) as f64);

        let whole = delay.floor();
        let frac = (delay - whole) as f32;
        let i0 = (self.write_pos + len - whole as usize) % len;
        let i1 = (i0 + len - 1) % len;
        let wet = self.buffer[i0] + frac * (self.buffer[i1] - self.buffer[i0]);

        self.buffer[self.write_pos] = input + wet * feedback;
        self.write_pos = (self.write_pos + 1) % len;

        wet
    }
}

/// Modulated-delay chorus.
#[derive(Debug, Clone)]
pub struct Chorus {
    params: ChorusParams,
    sample_rate: f64,
    lines: Vec<DelayLine>,
    /// LFO phase in cycles (0.0 to 1.0)
    phase: f64,
}

impl Chorus {
    /// Create an unprepared chorus; call [`Chorus::prepare`] before processing.
    pub fn new(params: ChorusParams) -> Self {
        let params = ChorusParams {
            depth: params.depth.clamp(0.0, 1.0),
            centre_delay_ms: params.centre_delay_ms.max(0.0),
            feedback: params.feedback.clamp(0.0, 0.95), // Limit to prevent runaway
            mix: params.mix.clamp(0.0, 1.0),
            ..params
        };
        Self {
            params,
            sample_rate: 0.0,
            lines: Vec::new(),
            phase: 0.0,
        }
    }

    pub fn params(&self) -> &ChorusParams {
        &self.params
    }

    /// Allocate one delay line per channel and clear all history.
    pub fn prepare(&mut self, sample_rate: f64, channels: usize) {
        let max_delay = self.params.max_delay_ms() * 1e-3 * sample_rate;
        let len = max_delay.ceil() as usize + 2;

        self.sample_rate = sample_rate;
        self.lines = (0..channels).map(|_| DelayLine::new(len)).collect();
        self.phase = 0.0;
    }

    /// Process every channel in place.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        if self.sample_rate <= 0.0 {
            return;
        }

        let ms_to_samples = 1e-3 * self.sample_rate;
        let centre = self.params.centre_delay_ms * ms_to_samples;
        let swing = self.params.swing_ms() * ms_to_samples;
        let increment = self.params.rate / self.sample_rate;
        let (feedback, mix) = (self.params.feedback, self.params.mix);

        let start_phase = self.phase;
        let mut end_phase = start_phase;

        for (line, samples) in self.lines.iter_mut().zip(channels.iter_mut()) {
            let mut phase = start_phase;
            for sample in samples.iter_mut() {
                let delay = centre + swing * (TAU * phase).sin();
                let dry = *sample;
                let wet = line.process(dry, delay, feedback);
                *sample = dry * (1.0 - mix) + wet * mix;

                phase += increment;
                if phase >= 1.0 {
                    phase -= 1.0;
                }
            }
            end_phase = phase;
        }

        self.phase = end_phase;
    }
}
