//! Advisory diagnostics
//!
//! Nothing in this module feeds back into prediction or reconciliation.
//! It exists for overlays, logs and tuning.

use rewind_core::{HistoryEntry, Tick, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity sliding window of samples
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a sample, dropping the oldest if full
    pub fn push(&mut self, sample: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean of the samples
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    /// Mean absolute deviation from the average
    pub fn mean_absolute_deviation(&self) -> Option<f32> {
        let average = self.average()?;
        let total: f32 = self.samples.iter().map(|s| (s - average).abs()).sum();
        Some(total / self.samples.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Tracks how regularly inputs leave the client
///
/// The send rate is the average interval between sends expressed in ticks:
/// 1.0 means one input per tick. The smoothed rate averages that value over
/// a longer window and reports its mean absolute deviation as jitter.
#[derive(Debug, Clone)]
pub struct SendRateMonitor {
    last_send: Option<f64>,
    intervals: RollingWindow,
    rates: RollingWindow,
    average_rate: f32,
    rate_deviation: f32,
}

impl SendRateMonitor {
    /// Create a monitor with the given window sizes
    pub fn new(send_window: usize, smoothed_window: usize) -> Self {
        Self {
            last_send: None,
            intervals: RollingWindow::new(send_window),
            rates: RollingWindow::new(smoothed_window),
            average_rate: 1.0,
            rate_deviation: 0.0,
        }
    }

    /// Note that an input was sent at `now` (seconds)
    pub fn record_send(&mut self, now: f64) {
        if let Some(last) = self.last_send {
            self.intervals.push((now - last) as f32);
        }
        self.last_send = Some(now);
    }

    /// Average send interval in ticks, if any interval was observed
    pub fn send_rate(&self, tick_duration: f32) -> Option<f32> {
        self.intervals.average().map(|avg| avg / tick_duration)
    }

    /// Fold the current send rate into the smoothed statistics
    pub fn update_smoothed(&mut self, tick_duration: f32) {
        let Some(rate) = self.send_rate(tick_duration) else {
            return;
        };
        self.rates.push(rate);
        self.average_rate = self.rates.average().unwrap_or(rate);
        self.rate_deviation = self.rates.mean_absolute_deviation().unwrap_or(0.0);
    }

    /// Smoothed send rate in ticks
    pub fn average_rate(&self) -> f32 {
        self.average_rate
    }

    /// Mean absolute deviation of the smoothed send rate
    pub fn rate_deviation(&self) -> f32 {
        self.rate_deviation
    }

    pub fn reset(&mut self) {
        self.last_send = None;
        self.intervals.clear();
        self.rates.clear();
        self.average_rate = 1.0;
        self.rate_deviation = 0.0;
    }
}

/// Counters for prediction accuracy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Prediction steps taken
    pub predictions: u64,
    /// Confirmations that matched a retained prediction
    pub confirmations: u64,
    /// Confirmations outside the tolerance
    pub mispredictions: u64,
    /// Confirmations discarded as stale
    pub stale: u64,
    /// Ticks re-simulated by replays
    pub replayed_ticks: u64,
    /// Replays cut short by missing history
    pub aborted_replays: u64,
    /// Average error distance over mispredictions
    pub avg_error_distance: f32,
    /// Largest error distance seen
    pub max_error_distance: f32,
}

impl ReconcileStats {
    /// Record a misprediction of `distance`
    pub fn record_misprediction(&mut self, distance: f32) {
        self.mispredictions += 1;
        let n = self.mispredictions as f32;
        self.avg_error_distance += (distance - self.avg_error_distance) / n;
        self.max_error_distance = self.max_error_distance.max(distance);
    }

    /// Fraction of evaluated confirmations that needed correction
    pub fn misprediction_ratio(&self) -> f32 {
        if self.confirmations == 0 {
            0.0
        } else {
            self.mispredictions as f32 / self.confirmations as f32
        }
    }
}

/// Read-only view of the movement history
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    /// Retained entries, oldest first
    pub entries: Vec<HistoryEntry>,
    /// Slot capacity, `None` if unbounded
    pub capacity: Option<usize>,
    /// Last tick the server confirmed
    pub last_confirmed_tick: Option<Tick>,
    /// Last tick predicted locally
    pub last_predicted_tick: Option<Tick>,
}

impl HistorySnapshot {
    /// Ticks predicted but not yet confirmed
    pub fn ticks_in_flight(&self) -> u64 {
        match (self.last_predicted_tick, self.last_confirmed_tick) {
            (Some(predicted), Some(confirmed)) => predicted.saturating_sub(confirmed),
            (Some(_), None) => self.entries.iter().filter(|e| e.input.is_some()).count() as u64,
            _ => 0,
        }
    }

    /// Fill ratio of the underlying buffer (0.0 to 1.0)
    pub fn fill_ratio(&self) -> Option<f32> {
        self.capacity
            .filter(|c| *c > 0)
            .map(|c| self.entries.len() as f32 / c as f32)
    }

    /// Predicted positions, newest first
    pub fn trail(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.entries.iter().rev().map(|e| e.position)
    }
}
