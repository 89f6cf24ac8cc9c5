//! Transport seams for inputs and confirmations
//!
//! Serialization and delivery belong to the network layer. The prediction
//! core only needs somewhere to hand outgoing inputs and somewhere to pick
//! up incoming confirmations between ticks.

use crate::reconciliation::ServerConfirmation;
use parking_lot::Mutex;
use rewind_core::InputRecord;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::debug;

/// Outbound channel for input records
///
/// Fire-and-forget: the core never waits for an acknowledgment.
pub trait InputSink {
    /// Hand one input record to the network layer
    fn send_input(&mut self, input: InputRecord);
}

impl InputSink for Vec<InputRecord> {
    fn send_input(&mut self, input: InputRecord) {
        self.push(input);
    }
}

impl InputSink for mpsc::Sender<InputRecord> {
    fn send_input(&mut self, input: InputRecord) {
        if self.send(input).is_err() {
            debug!(tick = input.tick, "input channel closed, dropping input");
        }
    }
}

/// Inbound queue of server confirmations
///
/// The network layer may push from any thread at any time. The tick loop
/// drains the queue between prediction steps, so a confirmation is never
/// evaluated while a step or replay is half applied. Clones share the same
/// queue.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationQueue {
    pending: Arc<Mutex<VecDeque<ServerConfirmation>>>,
}

impl ConfirmationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a confirmation as delivered by the network
    pub fn push(&self, confirmation: ServerConfirmation) {
        self.pending.lock().push_back(confirmation);
    }

    /// Take every pending confirmation in arrival order
    pub fn drain(&self) -> Vec<ServerConfirmation> {
        self.pending.lock().drain(..).collect()
    }

    /// Number of pending confirmations
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
