//! Movement history trait for tick-indexed inputs and predicted positions
//!
//! This trait is used by:
//! - `rewind-netcode` for prediction, replay and velocity estimation
//! - `rewind-rollback-buffer` for the bounded ring-buffer implementation
//!
//! Inputs and positions are written together by `record`. Once a tick is
//! confirmed its input is discarded, but the position stays around for
//! velocity lookback until it is evicted.

use crate::{InputRecord, Tick};
use glam::Vec3;
use tracing::debug;

/// One retained tick of history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    /// The tick this entry belongs to
    pub tick: Tick,
    /// Predicted (or corrected) position after the tick's movement
    pub position: Vec3,
    /// The input applied at this tick, `None` once confirmed
    pub input: Option<InputRecord>,
}

/// Trait for storing and retrieving per-tick movement history.
///
/// Implementations can choose different storage strategies:
/// - Ring buffer indexed by `tick % capacity` (bounded, for real-time)
/// - Ordered map (unbounded, for tests and tooling)
pub trait MovementHistory {
    /// Record the input and resulting position for a tick.
    ///
    /// Overwrites any existing entry at that tick. This is how replay
    /// corrects history.
    fn record(&mut self, tick: Tick, input: InputRecord, position: Vec3);

    /// Overwrite the position at a tick, keeping its input.
    ///
    /// Returns `false` if no entry exists for the tick.
    fn correct_position(&mut self, tick: Tick, position: Vec3) -> bool;

    /// Get the position recorded for exactly the given tick
    fn get_position(&self, tick: Tick) -> Option<Vec3>;

    /// Get the input recorded for exactly the given tick
    fn get_input(&self, tick: Tick) -> Option<InputRecord>;

    /// Drop the input at a tick, keeping its position.
    ///
    /// Returns the discarded input, if there was one.
    fn discard_input(&mut self, tick: Tick) -> Option<InputRecord>;

    /// Remove all entries strictly older than the given tick.
    fn evict_before(&mut self, tick: Tick);

    /// Remove all entries at or after the given tick.
    fn truncate_from(&mut self, tick: Tick);

    /// Clear all stored entries.
    fn clear(&mut self);

    /// Get the capacity of this history.
    ///
    /// Returns `None` for unbounded histories.
    fn capacity(&self) -> Option<usize>;

    /// Get the number of entries currently stored.
    fn len(&self) -> usize;

    /// Check if the history is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the tick range of stored entries as `(oldest, newest)`.
    fn tick_range(&self) -> Option<(Tick, Tick)>;

    /// All retained entries, oldest first.
    fn entries(&self) -> Vec<HistoryEntry>;

    /// Estimate the velocity going into `tick`.
    ///
    /// Uses the displacement between the positions at `tick - lookback` and
    /// `tick - 1`, divided by the time between them. Returns zero when either
    /// position is missing.
    fn velocity(&self, tick: Tick, lookback: u64, tick_duration: f32) -> Vec3 {
        let span = lookback.max(2);
        let (Some(start_tick), Some(end_tick)) = (tick.checked_sub(span), tick.checked_sub(1))
        else {
            debug!(tick, "no history before tick, using zero velocity");
            return Vec3::ZERO;
        };

        match (self.get_position(start_tick), self.get_position(end_tick)) {
            (Some(before), Some(after)) => {
                let seconds = (span - 1) as f32 * tick_duration;
                (after - before) / seconds
            }
            _ => {
                debug!(tick, "missing history for velocity, using zero velocity");
                Vec3::ZERO
            }
        }
    }
}
