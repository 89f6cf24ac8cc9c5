//! Rewind Netcode - Client-side prediction and server reconciliation
//!
//! This crate runs a locally controlled character ahead of the server:
//!
//! - **Input accumulation**: Coalesce polled intents into one record per tick
//! - **Prediction**: Apply each tick's input immediately through a movement chain
//! - **Reconciliation**: Compare server confirmations against predictions and
//!   replay buffered inputs when they diverge
//! - **Diagnostics**: Send cadence and prediction accuracy, advisory only
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Client                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │    Input     │─▶│   Movement   │─▶│ Movement History │    │
//! │  │ Accumulator  │  │    Chain     │  │  (per tick)      │    │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘    │
//! │         │                  ▲                   ▲             │
//! │         ▼                  │                   │             │
//! │  ┌──────────────┐  ┌──────────────────────────────────┐      │
//! │  │  InputSink   │  │  Reconciler (rewind + replay)    │◀─┐   │
//! │  └──────────────┘  └──────────────────────────────────┘  │   │
//! │                                      ConfirmationQueue ──┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rewind_core::{Clock, PredictionConfig};
//! use rewind_netcode::{processors::Walk, ConfirmationQueue, PredictionEngine};
//! use rewind_rollback_buffer::RollbackBuffer;
//!
//! let config = PredictionConfig::default();
//! let mut clock = Clock::new(config.tick_duration);
//! let mut engine = PredictionEngine::new(RollbackBuffer::new(config.history_capacity), config)?;
//! engine.push_processor(Walk::default());
//!
//! let confirmations = ConfirmationQueue::new(); // cloned into the network layer
//! loop {
//!     clock.accumulate(frame_dt);
//!     engine.add_input(w, s, a, d, space, shift, yaw, pitch);
//!     engine.drain_confirmations(&confirmations, &mut clock);
//!     engine.step(&clock, &mut outbound);
//!     render(engine.transform());
//! }
//! ```

mod diagnostics;
mod error;
mod input;
mod prediction;
mod processor;
pub mod processors;
mod reconciliation;
mod transport;

pub use diagnostics::{HistorySnapshot, ReconcileStats, RollingWindow, SendRateMonitor};
pub use error::{Error, Result};
pub use input::InputAccumulator;
pub use prediction::PredictionEngine;
pub use processor::{MovementChain, MovementProcessor, MovementStep};
pub use reconciliation::{ReconcileOutcome, ReconcilePhase, Reconciler, ServerConfirmation};
pub use transport::{ConfirmationQueue, InputSink};

// Re-export core trait for convenience
pub use rewind_core::MovementHistory;
