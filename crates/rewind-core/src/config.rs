//! Prediction Configuration - Tolerances, lookback and buffer sizes
//!
//! All numeric knobs of the prediction core live here so they can be tuned
//! per game (and per tick rate) without code changes. Configurations can be
//! built in code or loaded from RON:
//!
//! ```ron
//! (
//!     tick_duration: 0.0333,
//!     tolerance: 0.05,
//!     history_capacity: 256,
//! )
//! ```
//!
//! Fields left out of a RON document take their default values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for prediction and reconciliation
///
/// # Example
///
/// ```
/// use rewind_core::PredictionConfig;
///
/// let config = PredictionConfig::default().with_tolerance(0.25);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.velocity_lookback, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Nominal tick duration in seconds
    pub tick_duration: f32,

    /// Maximum distance between predicted and confirmed positions that is
    /// accepted without correction
    pub tolerance: f32,

    /// Number of ticks spanned by the velocity estimate
    ///
    /// `2` uses the positions at `t-2` and `t-1`. Eviction keeps exactly
    /// enough history behind each confirmation to serve this lookback.
    pub velocity_lookback: u64,

    /// Number of ring-buffer slots for movement history
    ///
    /// Must cover the ticks in flight (round trip time in ticks) plus the lookback.
    pub history_capacity: usize,

    /// Number of send intervals kept for the send-rate average
    pub send_rate_window: usize,

    /// Number of send-rate samples kept for the smoothed rate
    pub smoothed_rate_window: usize,
}

impl PredictionConfig {
    /// Parse a configuration from a RON string and validate it
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file and validate it
    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Set the tick duration
    pub fn with_tick_duration(mut self, seconds: f32) -> Self {
        self.tick_duration = seconds;
        self
    }

    /// Set the reconciliation tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the velocity lookback
    pub fn with_velocity_lookback(mut self, ticks: u64) -> Self {
        self.velocity_lookback = ticks;
        self
    }

    /// Set the history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_duration.is_finite() && self.tick_duration > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tick_duration must be positive, got {}",
                self.tick_duration
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if self.velocity_lookback < 2 {
            return Err(Error::InvalidConfig(format!(
                "velocity_lookback must be at least 2, got {}",
                self.velocity_lookback
            )));
        }
        if self.history_capacity as u64 <= self.velocity_lookback {
            return Err(Error::InvalidConfig(format!(
                "history_capacity ({}) must exceed velocity_lookback ({})",
                self.history_capacity, self.velocity_lookback
            )));
        }
        if self.send_rate_window == 0 || self.smoothed_rate_window == 0 {
            return Err(Error::InvalidConfig(
                "diagnostic windows must hold at least one sample".to_string(),
            ));
        }
        Ok(())
    }

    /// Ticks behind a confirmation that must stay in history
    ///
    /// With the default lookback of 2 this is 1: the confirmed tick and the
    /// one before it.
    pub fn retained_ticks(&self) -> u64 {
        self.velocity_lookback.saturating_sub(1)
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            tick_duration: 1.0 / 60.0,
            tolerance: 0.1,
            velocity_lookback: 2,
            history_capacity: 128,
            send_rate_window: 20,
            smoothed_rate_window: 50,
        }
    }
}
