//! Input accumulation between ticks
//!
//! Several polling sources (keyboard, gamepad, scripted input) may report
//! intents many times within one tick. They are coalesced here and turned
//! into exactly one `InputRecord` at the tick boundary.

use rewind_core::{InputRecord, Tick};

/// Accumulates control intents until the next tick boundary
///
/// Boolean intents are OR-ed together and cleared by each snapshot. Camera
/// angles are continuous: the latest value wins and is kept across ticks.
#[derive(Debug, Clone, Default)]
pub struct InputAccumulator {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    jump: bool,
    sprint: bool,
    yaw: f32,
    pitch: f32,
    /// Number of `add` calls since the last snapshot
    samples: u32,
}

impl InputAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one polled sample into the pending tick
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        forward: bool,
        back: bool,
        left: bool,
        right: bool,
        jump: bool,
        sprint: bool,
        yaw: f32,
        pitch: f32,
    ) {
        self.forward |= forward;
        self.back |= back;
        self.left |= left;
        self.right |= right;
        self.jump |= jump;
        self.sprint |= sprint;
        self.yaw = yaw;
        self.pitch = pitch;
        self.samples = self.samples.saturating_add(1);
    }

    /// Build the pending tick's record without consuming it
    pub fn peek(&self, tick: Tick) -> InputRecord {
        InputRecord {
            tick,
            forward: self.forward,
            back: self.back,
            left: self.left,
            right: self.right,
            jump: self.jump,
            sprint: self.sprint,
            camera_yaw: InputRecord::quantize_angle(self.yaw),
            camera_pitch: InputRecord::quantize_angle(self.pitch),
        }
    }

    /// Record for a tick nobody polled: no intents, latest camera angles
    ///
    /// Pending intents are left for the next snapshot.
    pub fn idle(&self, tick: Tick) -> InputRecord {
        InputRecord {
            camera_yaw: InputRecord::quantize_angle(self.yaw),
            camera_pitch: InputRecord::quantize_angle(self.pitch),
            ..InputRecord::idle(tick)
        }
    }

    /// Produce the record for `tick` and start accumulating the next one
    pub fn snapshot(&mut self, tick: Tick) -> InputRecord {
        let record = self.peek(tick);
        self.forward = false;
        self.back = false;
        self.left = false;
        self.right = false;
        self.jump = false;
        self.sprint = false;
        self.samples = 0;
        record
    }

    /// Number of samples merged since the last snapshot
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Forget everything, including camera angles
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_are_or_accumulated() {
        let mut acc = InputAccumulator::new();
        acc.add(true, false, false, false, false, false, 0.0, 0.0);
        acc.add(false, false, true, false, true, false, 0.0, 0.0);
        acc.add(false, false, false, false, false, false, 0.0, 0.0);

        let record = acc.snapshot(4);
        assert_eq!(record.tick, 4);
        assert!(record.forward);
        assert!(record.left);
        assert!(record.jump);
        assert!(!record.back);
        assert!(!record.sprint);
    }

    #[test]
    fn test_snapshot_clears_booleans_keeps_angles() {
        let mut acc = InputAccumulator::new();
        acc.add(true, true, true, true, true, true, 45.5, -10.25);
        assert_eq!(acc.samples(), 1);

        let first = acc.snapshot(1);
        assert_eq!(first.camera_yaw, 4_550_000);
        assert_eq!(first.camera_pitch, -1_025_000);

        let second = acc.snapshot(2);
        assert!(!second.has_movement());
        assert!(!second.jump);
        assert!(!second.sprint);
        assert_eq!(second.camera_yaw, first.camera_yaw);
        assert_eq!(second.camera_pitch, first.camera_pitch);
        assert_eq!(acc.samples(), 0);
    }

    #[test]
    fn test_latest_angle_wins() {
        let mut acc = InputAccumulator::new();
        acc.add(false, false, false, false, false, false, 10.0, 1.0);
        acc.add(false, false, false, false, false, false, 20.0, 2.0);

        let record = acc.peek(0);
        assert_eq!(record.yaw_degrees(), 20.0);
        assert_eq!(record.pitch_degrees(), 2.0);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut acc = InputAccumulator::new();
        acc.add(true, false, false, false, false, false, 0.0, 0.0);

        assert!(acc.peek(1).forward);
        assert!(acc.snapshot(1).forward);
        assert!(!acc.peek(2).forward);
    }

    #[test]
    fn test_reset() {
        let mut acc = InputAccumulator::new();
        acc.add(true, false, false, false, false, false, 30.0, 0.0);
        acc.reset();

        assert_eq!(acc.peek(0), InputRecord::idle(0));
    }

    #[test]
    fn test_idle_keeps_angles_and_intents() {
        let mut acc = InputAccumulator::new();
        acc.add(true, false, false, false, true, false, 90.0, -10.0);

        let idle = acc.idle(5);
        assert_eq!(idle.tick, 5);
        assert!(!idle.has_movement());
        assert!(!idle.jump);
        assert_eq!(idle.yaw_degrees(), 90.0);
        assert_eq!(idle.pitch_degrees(), -10.0);

        // Intents still belong to the next real snapshot
        let next = acc.snapshot(6);
        assert!(next.forward);
        assert!(next.jump);
    }
}
