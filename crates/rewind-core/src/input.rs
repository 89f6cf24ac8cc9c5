//! Per-tick input records
//!
//! An `InputRecord` is the immutable snapshot of one tick's control intents.
//! It is what gets sent to the server and what gets replayed during
//! reconciliation, so it must reproduce the same movement on both sides.

use crate::Tick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point scale applied to camera angles before transmission
///
/// Angles are multiplied by this factor and truncated to an integer so both
/// peers replay exactly the same value.
pub const QUANTIZATION_SCALE: f32 = 100_000.0;

/// One tick's worth of control intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputRecord {
    /// The tick this input was captured for
    pub tick: Tick,
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
    /// Camera yaw in degrees, quantized by `QUANTIZATION_SCALE`
    pub camera_yaw: i32,
    /// Camera pitch in degrees, quantized by `QUANTIZATION_SCALE`
    pub camera_pitch: i32,
}

impl InputRecord {
    /// Create an idle input for a tick
    pub fn idle(tick: Tick) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Quantize a camera angle for transmission (truncates toward zero)
    pub fn quantize_angle(degrees: f32) -> i32 {
        (degrees * QUANTIZATION_SCALE) as i32
    }

    /// Recover a camera angle from its quantized form
    pub fn dequantize_angle(quantized: i32) -> f32 {
        quantized as f32 / QUANTIZATION_SCALE
    }

    /// Camera yaw in degrees
    pub fn yaw_degrees(&self) -> f32 {
        Self::dequantize_angle(self.camera_yaw)
    }

    /// Camera pitch in degrees
    pub fn pitch_degrees(&self) -> f32 {
        Self::dequantize_angle(self.camera_pitch)
    }

    /// Whether any directional intent is set
    pub fn has_movement(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

impl fmt::Display for InputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[F:{} B:{} R:{} L:{}, J:{}, S:{}, Yaw:{}, Pitch:{}]",
            self.forward,
            self.back,
            self.right,
            self.left,
            self.jump,
            self.sprint,
            self.camera_yaw,
            self.camera_pitch
        )
    }
}
