//! Error types for rewind-netcode

use rewind_core::Tick;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input or position missing for a tick that should still be retained
    #[error("History missing for tick {tick} during replay")]
    MissingHistory { tick: Tick },

    /// Confirmation for an unknown, evicted or already confirmed tick
    #[error("Stale confirmation for tick {tick}")]
    StaleConfirmation { tick: Tick },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] rewind_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
