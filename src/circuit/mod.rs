//! Circuit model: fixed component values and the conductances derived from them.
//!
//! The [`CoefficientManager`] owns the only shared numerical state of the
//! signal path. It is written at block start and read-only while samples are
//! being processed.

mod coefficients;
mod constants;

pub use coefficients::{
    ClippingCoefficients, CoefficientManager, Coefficients, DistortionCoefficients,
};
pub use constants::{CircuitConstants, DiodeParams, RAIL_VOLTAGE};
