//! Rewind Rollback Buffer - Ring buffer for tick-indexed movement history
//!
//! This crate provides a bounded, allocation-free-after-construction
//! implementation of [`MovementHistory`] for the prediction loop.
//!
//! # Features
//!
//! - **Bounded memory**: Fixed-size ring buffer sized to the ticks in flight
//! - **O(1) record and lookup**: Slot is `tick % capacity`
//! - **Overwrite on record**: Replay rewrites history in place
//! - **Overflow detection**: Reusing a slot that still holds an older tick is logged
//!
//! # Example
//!
//! ```rust
//! use rewind_core::{InputRecord, MovementHistory, Vec3};
//! use rewind_rollback_buffer::RollbackBuffer;
//!
//! // Two seconds of history at 64 ticks per second
//! let mut buffer = RollbackBuffer::new(128);
//!
//! buffer.record(0, InputRecord::idle(0), Vec3::ZERO);
//! buffer.record(1, InputRecord::idle(1), Vec3::X);
//!
//! assert_eq!(buffer.get_position(1), Some(Vec3::X));
//!
//! // Confirmed up to tick 1: drop everything older
//! buffer.evict_before(1);
//! assert_eq!(buffer.len(), 1);
//! ```

use rewind_core::{HistoryEntry, InputRecord, MovementHistory, Tick, Vec3};
use tracing::warn;

/// A ring buffer of per-tick inputs and positions
///
/// Each tick maps to slot `tick % capacity`. A slot holds at most one tick;
/// lookups check the stored tick so stale slots never alias.
#[derive(Debug)]
pub struct RollbackBuffer {
    /// Ring buffer storage, `None` means the slot is empty
    slots: Vec<Option<HistoryEntry>>,
    /// Number of entries currently stored
    count: usize,
    /// Capacity (max entries)
    capacity: usize,
    /// Number of times a live entry was overwritten by a newer tick
    overflows: u64,
}

impl RollbackBuffer {
    /// Create a new rollback buffer with the given capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of ticks to retain (ticks in flight plus lookback)
    ///
    /// # Example
    ///
    /// ```rust
    /// use rewind_rollback_buffer::RollbackBuffer;
    ///
    /// let buffer = RollbackBuffer::new(64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            slots: vec![None; capacity],
            count: 0,
            capacity,
            overflows: 0,
        }
    }

    /// Get the slot index for a given tick
    fn tick_to_index(&self, tick: Tick) -> usize {
        (tick % self.capacity as u64) as usize
    }

    /// Get the live entry for a tick
    fn entry(&self, tick: Tick) -> Option<&HistoryEntry> {
        self.slots[self.tick_to_index(tick)]
            .as_ref()
            .filter(|e| e.tick == tick)
    }

    /// Get the live entry for a tick, mutably
    fn entry_mut(&mut self, tick: Tick) -> Option<&mut HistoryEntry> {
        let index = self.tick_to_index(tick);
        self.slots[index].as_mut().filter(|e| e.tick == tick)
    }

    /// Remove every entry matching a predicate
    fn remove_where(&mut self, predicate: impl Fn(Tick) -> bool) {
        for slot in &mut self.slots {
            if slot.is_some_and(|e| predicate(e.tick)) {
                *slot = None;
                self.count = self.count.saturating_sub(1);
            }
        }
    }

    /// Iterate stored entries (oldest to newest)
    pub fn iter(&self) -> impl Iterator<Item = HistoryEntry> {
        self.entries().into_iter()
    }

    /// Number of live entries lost to slot reuse
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        let (oldest, newest) = self.tick_range().unwrap_or((0, 0));
        BufferStats {
            capacity: self.capacity,
            count: self.count,
            oldest_tick: oldest,
            newest_tick: newest,
        }
    }
}

impl MovementHistory for RollbackBuffer {
    fn record(&mut self, tick: Tick, input: InputRecord, position: Vec3) {
        let index = self.tick_to_index(tick);

        match self.slots[index] {
            None => self.count += 1,
            Some(old) if old.tick != tick => {
                self.overflows += 1;
                warn!(
                    tick,
                    evicted = old.tick,
                    capacity = self.capacity,
                    "movement history full, overwriting unevicted tick"
                );
            }
            Some(_) => {}
        }

        self.slots[index] = Some(HistoryEntry {
            tick,
            position,
            input: Some(input),
        });
    }

    fn correct_position(&mut self, tick: Tick, position: Vec3) -> bool {
        match self.entry_mut(tick) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    fn get_position(&self, tick: Tick) -> Option<Vec3> {
        self.entry(tick).map(|e| e.position)
    }

    fn get_input(&self, tick: Tick) -> Option<InputRecord> {
        self.entry(tick).and_then(|e| e.input)
    }

    fn discard_input(&mut self, tick: Tick) -> Option<InputRecord> {
        self.entry_mut(tick).and_then(|e| e.input.take())
    }

    fn evict_before(&mut self, tick: Tick) {
        self.remove_where(|t| t < tick);
    }

    fn truncate_from(&mut self, tick: Tick) {
        self.remove_where(|t| t >= tick);
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.count = 0;
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn tick_range(&self) -> Option<(Tick, Tick)> {
        let mut ticks = self.slots.iter().flatten().map(|e| e.tick);
        let first = ticks.next()?;
        Some(ticks.fold((first, first), |(min, max), t| (min.min(t), max.max(t))))
    }

    fn entries(&self) -> Vec<HistoryEntry> {
        let mut entries: Vec<_> = self.slots.iter().flatten().copied().collect();
        entries.sort_by_key(|e| e.tick);
        entries
    }
}

impl Default for RollbackBuffer {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60 ticks per second
    }
}

/// Statistics about the rollback buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored entries
    pub count: usize,
    /// Oldest tick in the buffer
    pub oldest_tick: Tick,
    /// Newest tick in the buffer
    pub newest_tick: Tick,
}

impl BufferStats {
    /// Get the tick span (newest - oldest)
    pub fn tick_span(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.newest_tick - self.oldest_tick
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
