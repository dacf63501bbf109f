//! User controls: knob targets, smoothing, level scaling and the tremolo.

mod knob;
mod params;
mod tremolo;

pub use knob::{level_scale, SmoothedKnob, LEVEL_EPSILON, SMOOTHING_FACTOR, SNAP_DISTANCE};
pub use params::{
    ParameterSnapshot, Parameters, DEFAULT_KNOB, DEFAULT_TREMOLO_RATE, TREMOLO_RATE_RANGE,
};
pub use tremolo::{Tremolo, DEFAULT_DEPTH as DEFAULT_TREMOLO_DEPTH};
