//! Time system for tick-based prediction
//!
//! Provides discrete time management for the prediction loop:
//! - `Tick` - Logical time unit (a "command frame")
//! - `TickSource` - What the prediction core needs from a clock
//! - `Clock` - Fixed-step clock with server-driven timing adjustment

use crate::{PredictionConfig, Result};
use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Bounds on the effective frame length, as multiples of the nominal tick duration
const MIN_FRAME_SCALE: f32 = 0.5;
const MAX_FRAME_SCALE: f32 = 2.0;

/// Source of logical time consumed by the prediction core
///
/// The core polls `current_tick()` and runs one prediction step per distinct
/// value it observes. Confirmations from the server carry a timing adjustment
/// which is forwarded through `set_timing_adjustment`.
pub trait TickSource {
    /// The current tick index
    fn current_tick(&self) -> Tick;

    /// Nominal duration of one tick, in seconds
    fn tick_duration(&self) -> f32;

    /// Apply the server-supplied timing adjustment (seconds per tick)
    fn set_timing_adjustment(&mut self, delta: f32);

    /// Seconds elapsed since the source started
    ///
    /// Only used for advisory diagnostics. The default derives it from the tick count.
    fn elapsed_seconds(&self) -> f64 {
        self.current_tick() as f64 * self.tick_duration() as f64
    }
}

/// Fixed-step simulation clock
///
/// Converts elapsed real time into ticks. The server can dilate the local
/// frame length through a timing adjustment so the client stays a steady
/// number of ticks ahead of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    /// Current tick number
    tick: Tick,
    /// Nominal tick duration in seconds
    tick_duration: f32,
    /// Server-supplied adjustment added to the frame length
    timing_adjustment: f32,
    /// Locally tuned adjustment added to the frame length
    manual_fudge: f32,
    /// Time accumulated towards the next tick
    accumulator: f32,
    /// Total time fed into the clock
    elapsed: f64,
}

impl Clock {
    /// Create a new clock at tick 0
    ///
    /// # Panics
    ///
    /// Panics if `tick_duration` is not a positive, finite number of seconds.
    /// Use [`Clock::from_config`] to get an error instead.
    pub fn new(tick_duration: f32) -> Self {
        assert!(
            tick_duration.is_finite() && tick_duration > 0.0,
            "Tick duration must be positive, got {tick_duration}"
        );
        Self {
            tick: 0,
            tick_duration,
            timing_adjustment: 0.0,
            manual_fudge: 0.0,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Create a clock at tick 0 from a validated configuration
    pub fn from_config(config: &PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.tick_duration))
    }

    /// Create a clock starting at a specific tick
    pub fn starting_at(tick: Tick, tick_duration: f32) -> Self {
        Self {
            tick,
            ..Self::new(tick_duration)
        }
    }

    /// Advance to the next tick
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed += self.frame_length() as f64;
    }

    /// Feed elapsed real time into the clock
    ///
    /// Returns the number of ticks that elapsed. Leftover time carries over
    /// to the next call.
    pub fn accumulate(&mut self, dt: f32) -> u64 {
        self.elapsed += dt as f64;
        self.accumulator += dt;

        let frame = self.frame_length();
        let mut advanced = 0;
        if !(frame.is_finite() && frame > 0.0) {
            return advanced;
        }
        while self.accumulator >= frame {
            self.accumulator -= frame;
            self.tick += 1;
            advanced += 1;
        }
        advanced
    }

    /// Effective frame length after adjustments
    pub fn frame_length(&self) -> f32 {
        // max/min rather than clamp: a deserialized clock may carry any duration
        (self.tick_duration + self.timing_adjustment + self.manual_fudge)
            .max(self.tick_duration * MIN_FRAME_SCALE)
            .min(self.tick_duration * MAX_FRAME_SCALE)
    }

    /// Current server adjustment
    pub fn timing_adjustment(&self) -> f32 {
        self.timing_adjustment
    }

    /// Current manual fudge
    pub fn manual_fudge(&self) -> f32 {
        self.manual_fudge
    }

    /// Set a local frame-length fudge (seconds)
    pub fn set_manual_fudge(&mut self, fudge: f32) {
        self.manual_fudge = fudge;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl TickSource for Clock {
    fn current_tick(&self) -> Tick {
        self.tick
    }

    fn tick_duration(&self) -> f32 {
        self.tick_duration
    }

    fn set_timing_adjustment(&mut self, delta: f32) {
        self.timing_adjustment = delta;
    }

    fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = Clock::new(0.1);
        assert_eq!(clock.current_tick(), 0);

        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick(), 2);
    }

    #[test]
    fn test_accumulate_carries_remainder() {
        let mut clock = Clock::new(0.25);

        assert_eq!(clock.accumulate(0.125), 0);
        assert_eq!(clock.accumulate(0.125), 1);
        assert_eq!(clock.accumulate(0.625), 2);
        assert_eq!(clock.current_tick(), 3);
        assert!((clock.elapsed_seconds() - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_timing_adjustment_dilates_frames() {
        let mut clock = Clock::new(0.25);
        clock.set_timing_adjustment(0.25);
        assert_eq!(clock.frame_length(), 0.5);
        assert_eq!(clock.accumulate(1.0), 2);

        // Nominal duration is unaffected
        assert_eq!(clock.tick_duration(), 0.25);
    }

    #[test]
    fn test_frame_length_is_clamped() {
        let mut clock = Clock::new(0.1);
        clock.set_timing_adjustment(-1.0);
        assert!((clock.frame_length() - 0.05).abs() < 1e-6);

        clock.set_timing_adjustment(1.0);
        assert!((clock.frame_length() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_starting_at() {
        let clock = Clock::starting_at(100, 0.5);
        assert_eq!(clock.current_tick(), 100);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    #[should_panic(expected = "Tick duration must be positive")]
    fn test_zero_duration_rejected() {
        let _ = Clock::new(0.0);
    }

    #[test]
    #[should_panic(expected = "Tick duration must be positive")]
    fn test_negative_duration_rejected() {
        let _ = Clock::starting_at(10, -0.1);
    }

    #[test]
    fn test_from_config() {
        let config = PredictionConfig::default().with_tick_duration(0.25);
        let clock = Clock::from_config(&config).unwrap();
        assert_eq!(clock.tick_duration(), 0.25);
        assert_eq!(clock.current_tick(), 0);

        let config = PredictionConfig::default().with_tick_duration(0.0);
        assert!(Clock::from_config(&config).is_err());
    }

    #[test]
    fn test_deserialized_zero_duration_does_not_spin() {
        let mut clock: Clock = ron::from_str(
            "(tick: 3, tick_duration: 0.0, timing_adjustment: 0.0, manual_fudge: 0.0, \
             accumulator: 0.0, elapsed: 0.0)",
        )
        .unwrap();
        assert_eq!(clock.accumulate(1.0), 0);
        assert_eq!(clock.current_tick(), 3);
    }
}
