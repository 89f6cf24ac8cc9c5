//! Server state reconciliation
//!
//! Compares authoritative positions against the locally predicted ones and,
//! when they disagree, rewinds to the server's position and replays every
//! buffered input up to the present tick.
//!
//! ```text
//!   Idle ──confirmation──▶ Evaluating ──within tolerance──▶ Confirmed ──▶ Idle
//!                               │
//!                               └──────diverged──────▶ Replaying ──▶ Idle
//! ```

use crate::diagnostics::ReconcileStats;
use crate::processor::MovementChain;
use crate::Error;
use rewind_core::{MovementHistory, PredictionConfig, Tick, Transform, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

/// Authoritative position for one tick, as sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerConfirmation {
    /// Tick the position belongs to
    pub tick: Tick,
    /// Server position after that tick
    pub position: Vec3,
    /// Frame length adjustment for the local clock
    pub timing_adjustment: f32,
}

impl ServerConfirmation {
    pub fn new(tick: Tick, position: Vec3, timing_adjustment: f32) -> Self {
        Self {
            tick,
            position,
            timing_adjustment,
        }
    }
}

/// Where the reconciler is in handling a confirmation
///
/// Handling is synchronous, so the reconciler is always `Idle` between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePhase {
    #[default]
    Idle,
    Evaluating,
    Confirmed,
    Replaying,
}

/// What handling a confirmation did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Unknown, evicted, duplicate or out-of-order tick; nothing changed
    Stale { tick: Tick },
    /// Prediction was within tolerance
    Confirmed { tick: Tick, distance: f32 },
    /// Prediction diverged; history from `tick` onward was rewritten
    Replayed {
        tick: Tick,
        distance: f32,
        replayed: u64,
    },
    /// Replay stopped at `missing` because its input was gone
    ReplayAborted {
        tick: Tick,
        distance: f32,
        replayed: u64,
        missing: Tick,
    },
}

impl ReconcileOutcome {
    /// The confirmed tick
    pub fn tick(&self) -> Tick {
        match self {
            Self::Stale { tick }
            | Self::Confirmed { tick, .. }
            | Self::Replayed { tick, .. }
            | Self::ReplayAborted { tick, .. } => *tick,
        }
    }

    /// Whether local history was corrected
    pub fn corrected(&self) -> bool {
        matches!(self, Self::Replayed { .. } | Self::ReplayAborted { .. })
    }

    /// The anomaly behind this outcome, if any
    pub fn error(&self) -> Option<Error> {
        match *self {
            Self::Stale { tick } => Some(Error::StaleConfirmation { tick }),
            Self::ReplayAborted { missing, .. } => Some(Error::MissingHistory { tick: missing }),
            _ => None,
        }
    }
}

/// Applies server confirmations to the local prediction
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Accepted distance between prediction and confirmation
    tolerance: f32,
    /// Velocity lookback in ticks
    lookback: u64,
    /// Last confirmation that was evaluated
    last_confirmed_tick: Option<Tick>,
    phase: ReconcilePhase,
    stats: ReconcileStats,
}

impl Reconciler {
    /// Create a reconciler from configuration
    pub fn new(config: &PredictionConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            lookback: config.velocity_lookback,
            last_confirmed_tick: None,
            phase: ReconcilePhase::Idle,
            stats: ReconcileStats::default(),
        }
    }

    /// Handle one confirmation
    ///
    /// `current_tick` is the last tick predicted locally; replay runs up to
    /// and including it. On return `transform` holds the present-time state.
    pub fn reconcile<H: MovementHistory + ?Sized>(
        &mut self,
        confirmation: &ServerConfirmation,
        current_tick: Tick,
        tick_duration: f32,
        transform: &mut Transform,
        history: &mut H,
        chain: &mut MovementChain,
    ) -> ReconcileOutcome {
        self.phase = ReconcilePhase::Evaluating;
        let tick = confirmation.tick;

        let already_confirmed = self.last_confirmed_tick.is_some_and(|last| tick <= last);
        let predicted = match history.get_position(tick) {
            Some(position) if !already_confirmed => position,
            _ => {
                debug!(tick, "discarding stale confirmation");
                self.stats.stale += 1;
                self.phase = ReconcilePhase::Idle;
                return ReconcileOutcome::Stale { tick };
            }
        };

        self.stats.confirmations += 1;
        let distance = predicted.distance(confirmation.position);

        let outcome = if distance <= self.tolerance {
            self.phase = ReconcilePhase::Confirmed;
            debug!(tick, distance, "prediction confirmed");
            ReconcileOutcome::Confirmed { tick, distance }
        } else {
            self.phase = ReconcilePhase::Replaying;
            self.stats.record_misprediction(distance);
            info!(
                tick,
                distance,
                predicted = ?predicted,
                actual = ?confirmation.position,
                from = tick + 1,
                to = current_tick,
                "mispredicted, replaying input"
            );

            let (replayed, missing) = self.replay(
                confirmation,
                current_tick,
                tick_duration,
                transform,
                history,
                chain,
            );
            match missing {
                None => ReconcileOutcome::Replayed {
                    tick,
                    distance,
                    replayed,
                },
                Some(missing) => {
                    error!(
                        tick,
                        missing,
                        replayed,
                        "input missing during replay, history truncated"
                    );
                    self.stats.aborted_replays += 1;
                    ReconcileOutcome::ReplayAborted {
                        tick,
                        distance,
                        replayed,
                        missing,
                    }
                }
            }
        };

        // The confirmed input is done with; keep just enough positions for velocity
        history.discard_input(tick);
        let keep_from = tick.saturating_sub(self.lookback.saturating_sub(1));
        history.evict_before(keep_from);
        chain.clean(keep_from);

        self.last_confirmed_tick = Some(tick);
        self.phase = ReconcilePhase::Idle;
        outcome
    }

    /// Rewind to the confirmed position and re-simulate up to `current_tick`
    ///
    /// Returns the number of replayed ticks and the first tick whose input was
    /// missing, if any. Entries from that tick onward are dropped and the
    /// transform stays at the last replayed tick.
    fn replay<H: MovementHistory + ?Sized>(
        &mut self,
        confirmation: &ServerConfirmation,
        current_tick: Tick,
        tick_duration: f32,
        transform: &mut Transform,
        history: &mut H,
        chain: &mut MovementChain,
    ) -> (u64, Option<Tick>) {
        let tick = confirmation.tick;

        transform.position = confirmation.position;
        if let Some(input) = history.get_input(tick) {
            transform.yaw = input.yaw_degrees();
        }
        history.correct_position(tick, confirmation.position);

        let mut replayed = 0;
        for i in tick + 1..=current_tick {
            let Some(input) = history.get_input(i) else {
                history.truncate_from(i);
                self.stats.replayed_ticks += replayed;
                return (replayed, Some(i));
            };

            let velocity = history.velocity(i, self.lookback, tick_duration);
            let previous = history.get_position(i);
            *transform = chain.apply(*transform, &input, i, velocity, tick_duration);
            history.record(i, input, transform.position);

            trace!(
                tick = i,
                %input,
                previous = ?previous,
                velocity = ?velocity,
                adjusted = ?transform.position,
                "replayed tick"
            );
            replayed += 1;
        }

        self.stats.replayed_ticks += replayed;
        (replayed, None)
    }

    /// Last confirmation that was evaluated
    pub fn last_confirmed_tick(&self) -> Option<Tick> {
        self.last_confirmed_tick
    }

    /// Current phase (always `Idle` between calls)
    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    /// Accuracy counters
    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    /// Mutable access to the counters
    pub fn stats_mut(&mut self) -> &mut ReconcileStats {
        &mut self.stats
    }

    /// Forget confirmation progress and counters
    pub fn reset(&mut self) {
        self.last_confirmed_tick = None;
        self.phase = ReconcilePhase::Idle;
        self.stats = ReconcileStats::default();
    }
}
