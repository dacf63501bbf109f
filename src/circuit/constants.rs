//! Component values of the modelled pedal circuit.
//!
//! Distortion stage: an op-amp gain stage whose feedback leg is
//! `R3 + drive pot` in series with `C1`, with `R4` setting the gain.
//! Clipping stage: a series coupling capacitor `C2` into `R5` shunted by
//! an anti-parallel diode pair.

use crate::THERMAL_VOLTAGE;

/// Op-amp rail saturation voltage of the distortion stage.
pub const RAIL_VOLTAGE: f64 = 4.5;

/// Parameters for the anti-parallel diode pair.
///
/// The pair conducts `I = 2·Is·sinh(V / (n·Vt))`; the factor of two is folded
/// into `is` so the residual reads `Is·sinh(V / (n·Vt))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeParams {
    /// Reverse saturation current (Is)
    pub is: f64,
    /// Emission coefficient (η)
    pub n: f64,
    /// Thermal voltage (Vt)
    pub vt: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self {
            is: 1e-6,
            n: 2.0,
            vt: THERMAL_VOLTAGE,
        }
    }
}

impl DiodeParams {
    /// Thermal voltage times emission coefficient.
    pub fn n_vt(&self) -> f64 {
        self.n * self.vt
    }

    /// Diode pair current at voltage `v`.
    pub fn current(&self, v: f64) -> f64 {
        self.is * (v / self.n_vt()).sinh()
    }

    /// Small-signal conductance dI/dV at voltage `v`.
    pub fn conductance(&self, v: f64) -> f64 {
        let n_vt = self.n_vt();
        self.is / n_vt * (v / n_vt).cosh()
    }
}

/// Fixed component values for both stages, given at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitConstants {
    /// Distortion stage capacitor C1 (F)
    pub c1: f64,
    /// Distortion stage series resistor R3 (Ω)
    pub r3: f64,
    /// Distortion stage gain resistor R4 (Ω)
    pub r4: f64,
    /// Full-scale resistance of the drive pot (Ω)
    pub pot_max: f64,
    /// Clipping stage coupling capacitor C2 (F)
    pub c2: f64,
    /// Clipping stage shunt resistor R5 (Ω)
    pub r5: f64,
    /// Clipping diode model
    pub diode: DiodeParams,
}

impl Default for CircuitConstants {
    fn default() -> Self {
        Self {
            c1: 47e-9,
            r3: 4.7e3,
            r4: 1e6,
            pot_max: 1e6,
            c2: 1e-9,
            r5: 10e3,
            diode: DiodeParams::default(),
        }
    }
}

impl CircuitConstants {
    /// Drive pot resistance for a smoothed knob position in [0, 1].
    ///
    /// Fully clockwise shorts the pot out; fully counter-clockwise gives `pot_max`.
    pub fn pot_resistance(&self, position: f64) -> f64 {
        self.pot_max * (1.0 - position.clamp(0.0, 1.0))
    }
}
