//! Distortion stage: first-order RC driven gain stage.
//!
//! With C1 replaced by its trapezoidal companion (resistance `R1`, history
//! current `x1`), the stage is solved in closed form each sample:
//!
//! ```text
//! Vb  = Gb·Vi − R1·Gb·x1        (node between R3+Rp and C1)
//! Vo  = Gi·Vi − Gx1·x1          (op-amp output, then rail-clipped)
//! x1' = 2·(Vi − Vb)/R1 − x1
//! ```

use crate::circuit::{DistortionCoefficients, RAIL_VOLTAGE};

/// Stateless distortion stage; the history term lives in the caller's
/// per-channel state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistortionStage;

impl DistortionStage {
    /// Process one sample, updating `x1` in place.
    ///
    /// Output is hard-limited to `±RAIL_VOLTAGE`.
    #[inline]
    pub fn process(k: &DistortionCoefficients, vi: f64, x1: &mut f64) -> f64 {
        let vb = k.gb * vi - k.r1 * k.gb * *x1;
        let vr1 = vi - vb;
        let vo = k.gi * vi - k.gx1 * *x1;

        *x1 = 2.0 * vr1 / k.r1 - *x1;

        vo.clamp(-RAIL_VOLTAGE, RAIL_VOLTAGE)
    }
}
