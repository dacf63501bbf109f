//! Persisted plugin state.
//!
//! Only the tremolo settings survive a save/load cycle. The layout is fixed
//! and unversioned:
//!
//! ```text
//! offset 0  f32  tremolo rate (little-endian IEEE-754)
//! offset 4  u8   tremolo on (0 = off, anything else = on)
//! ```

use crate::controls::Parameters;
use crate::error::{DisruptionError, Result};

/// Size of the serialized state in bytes.
pub const STATE_SIZE: usize = 5;

/// The saved subset of [`Parameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedState {
    pub tremolo_rate: f32,
    pub tremolo_on: bool,
}

impl PersistedState {
    /// Capture the persisted fields from live parameters.
    pub fn capture(params: &Parameters) -> Self {
        Self {
            tremolo_rate: params.tremolo_rate(),
            tremolo_on: params.tremolo_on(),
        }
    }

    /// Write the persisted fields back into live parameters.
    pub fn apply(&self, params: &Parameters) {
        params.set_tremolo_rate(self.tremolo_rate);
        params.set_tremolo_on(self.tremolo_on);
    }

    pub fn to_bytes(&self) -> [u8; STATE_SIZE] {
        let mut bytes = [0u8; STATE_SIZE];
        bytes[..4].copy_from_slice(&self.tremolo_rate.to_le_bytes());
        bytes[4] = u8::from(self.tremolo_on);
        bytes
    }

    /// Decode a saved blob; bytes past the fixed layout are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < STATE_SIZE {
            return Err(DisruptionError::state_truncated(STATE_SIZE, bytes.len()));
        }

        let rate = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok(Self {
            tremolo_rate: f32::from_le_bytes(rate),
            tremolo_on: bytes[4] != 0,
        })
    }
}
