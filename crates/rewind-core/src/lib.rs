//! Rewind Core - Shared types for client-side prediction
//!
//! This crate provides the building blocks the prediction and
//! reconciliation layers are written against:
//! - Logical time (`Tick`, `TickSource`, `Clock`)
//! - Per-tick input snapshots (`InputRecord`) with quantized camera angles
//! - Character transforms (`Transform`)
//! - The `MovementHistory` trait for tick-indexed input/position storage
//! - Tunable settings (`PredictionConfig`)
//!
//! ## Determinism
//!
//! Nothing in this crate reads a wall clock or global state. The tick is
//! always passed explicitly, so every component can be driven from tests
//! without a live clock.

mod config;
mod error;
mod history;
mod input;
pub mod time;
mod transform;

pub use config::PredictionConfig;
pub use error::{Error, Result};
pub use history::{HistoryEntry, MovementHistory};
pub use input::{InputRecord, QUANTIZATION_SCALE};
pub use time::{Clock, Tick, TickSource};
pub use transform::Transform;

// Re-export the vector type used for positions and velocities
pub use glam::Vec3;
