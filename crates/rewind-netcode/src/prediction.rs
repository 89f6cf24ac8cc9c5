//! Client-side prediction engine
//!
//! Runs one movement step per tick ahead of the server, records what it did,
//! and hands confirmations to the [`Reconciler`]. Works with any
//! [`MovementHistory`] implementation for storage.
//!
//! All entry points take `&mut self`, so a confirmation can never be
//! evaluated in the middle of a prediction step or a replay.

use crate::diagnostics::{HistorySnapshot, ReconcileStats, SendRateMonitor};
use crate::input::InputAccumulator;
use crate::processor::{MovementChain, MovementProcessor};
use crate::reconciliation::{ReconcileOutcome, ReconcilePhase, Reconciler, ServerConfirmation};
use crate::transport::{ConfirmationQueue, InputSink};
use crate::Result;
use rewind_core::{
    InputRecord, MovementHistory, PredictionConfig, Tick, TickSource, Transform, Vec3,
};
use std::fmt;
use tracing::{debug, warn};

/// Client-side prediction engine
///
/// Generic over `H: MovementHistory` to allow different storage backends.
pub struct PredictionEngine<H: MovementHistory> {
    config: PredictionConfig,
    /// Inputs and predicted positions per tick
    history: H,
    /// Movement processors, shared by prediction and replay
    chain: MovementChain,
    /// Intents gathered for the next tick
    accumulator: InputAccumulator,
    reconciler: Reconciler,
    /// Present-time transform of the local character
    transform: Transform,
    /// Last tick a prediction step ran for
    last_tick: Option<Tick>,
    /// Tick duration reported by the clock at the last step
    tick_duration: f32,
    send_rate: SendRateMonitor,
}

impl<H: MovementHistory> PredictionEngine<H> {
    /// Create a new prediction engine
    ///
    /// Fails if the configuration does not validate.
    pub fn new(history: H, config: PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history,
            chain: MovementChain::new(),
            accumulator: InputAccumulator::new(),
            reconciler: Reconciler::new(&config),
            transform: Transform::default(),
            last_tick: None,
            tick_duration: config.tick_duration,
            send_rate: SendRateMonitor::new(config.send_rate_window, config.smoothed_rate_window),
            config,
        })
    }

    /// Create with a starting transform
    pub fn with_transform(
        history: H,
        config: PredictionConfig,
        transform: Transform,
    ) -> Result<Self> {
        let mut engine = Self::new(history, config)?;
        engine.transform = transform;
        Ok(engine)
    }

    /// Accumulate intents for the next tick
    ///
    /// Callable any number of times between ticks. Never fails.
    #[allow(clippy::too_many_arguments)]
    pub fn add_input(
        &mut self,
        forward: bool,
        back: bool,
        left: bool,
        right: bool,
        jump: bool,
        sprint: bool,
        yaw: f32,
        pitch: f32,
    ) {
        self.accumulator
            .add(forward, back, left, right, jump, sprint, yaw, pitch);
    }

    /// Replace the movement processor chain
    pub fn set_movement_processors(&mut self, processors: Vec<Box<dyn MovementProcessor>>) {
        self.chain.replace(processors);
    }

    /// Append a single processor to the chain
    pub fn push_processor(&mut self, processor: impl MovementProcessor + 'static) {
        self.chain.push(processor);
    }

    /// Run the prediction step for the clock's current tick
    ///
    /// Does nothing if that tick was already stepped, so it is safe to call
    /// every frame. If the clock skipped ticks since the last step, each
    /// skipped tick is predicted first with an idle input, keeping history
    /// contiguous for replay. Returns the input sent for the current tick.
    pub fn step<C, S>(&mut self, clock: &C, sink: &mut S) -> Option<InputRecord>
    where
        C: TickSource + ?Sized,
        S: InputSink + ?Sized,
    {
        debug_assert_eq!(self.reconciler.phase(), ReconcilePhase::Idle);

        let tick = clock.current_tick();
        let first = match self.last_tick {
            Some(last) if tick == last => return None,
            Some(last) if tick < last => {
                warn!(tick, last, "tick source went backwards, ignoring");
                return None;
            }
            Some(last) => last + 1,
            None => tick,
        };
        self.tick_duration = clock.tick_duration();
        let elapsed = clock.elapsed_seconds();

        if first < tick {
            warn!(
                tick,
                last = first - 1,
                skipped = tick - first,
                "tick source skipped ticks, predicting them idle"
            );
            // Only as many ticks as history can hold next to the current one
            let fill_from = match self.history.capacity() {
                Some(capacity) => {
                    let room = (capacity as Tick).saturating_sub(1);
                    first.max(tick.saturating_sub(room))
                }
                None => first,
            };
            if fill_from > first {
                self.history.evict_before(fill_from);
            }
            for skipped in fill_from..tick {
                let input = self.accumulator.idle(skipped);
                self.predict(input, elapsed, sink);
            }
        }

        let input = self.accumulator.snapshot(tick);
        self.predict(input, elapsed, sink);
        Some(input)
    }

    /// Send, simulate and record one tick
    fn predict<S: InputSink + ?Sized>(&mut self, input: InputRecord, now: f64, sink: &mut S) {
        let tick = input.tick;
        sink.send_input(input);
        self.send_rate.record_send(now);

        let velocity = self.velocity(tick);
        self.transform = self
            .chain
            .apply(self.transform, &input, tick, velocity, self.tick_duration);
        self.history.record(tick, input, self.transform.position);

        self.last_tick = Some(tick);
        self.reconciler.stats_mut().predictions += 1;
        self.send_rate.update_smoothed(self.tick_duration);
    }

    /// Handle one server confirmation
    ///
    /// The timing adjustment is forwarded to the clock whatever the outcome.
    pub fn on_confirmation<C>(
        &mut self,
        confirmation: &ServerConfirmation,
        clock: &mut C,
    ) -> ReconcileOutcome
    where
        C: TickSource + ?Sized,
    {
        let outcome = match self.last_tick {
            Some(current) => self.reconciler.reconcile(
                confirmation,
                current,
                self.tick_duration,
                &mut self.transform,
                &mut self.history,
                &mut self.chain,
            ),
            None => {
                debug!(tick = confirmation.tick, "confirmation before first prediction");
                self.reconciler.stats_mut().stale += 1;
                ReconcileOutcome::Stale {
                    tick: confirmation.tick,
                }
            }
        };

        clock.set_timing_adjustment(confirmation.timing_adjustment);
        outcome
    }

    /// Handle every confirmation waiting in `queue`, in arrival order
    pub fn drain_confirmations<C>(
        &mut self,
        queue: &ConfirmationQueue,
        clock: &mut C,
    ) -> Vec<ReconcileOutcome>
    where
        C: TickSource + ?Sized,
    {
        queue
            .drain()
            .iter()
            .map(|confirmation| self.on_confirmation(confirmation, &mut *clock))
            .collect()
    }

    /// Velocity estimate going into `tick`
    ///
    /// Zero when the lookback positions are not in history.
    pub fn velocity(&self, tick: Tick) -> Vec3 {
        self.history
            .velocity(tick, self.config.velocity_lookback, self.tick_duration)
    }

    /// Present-time transform
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Move the character directly
    ///
    /// History is left alone; the next step continues from here.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Start over from `transform`, forgetting all history and counters
    pub fn reset(&mut self, transform: Transform) {
        self.history.clear();
        self.chain.clean(Tick::MAX);
        self.accumulator.reset();
        self.reconciler.reset();
        self.send_rate.reset();
        self.transform = transform;
        self.last_tick = None;
    }

    /// Read-only view of buffered history
    pub fn history_snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            entries: self.history.entries(),
            capacity: self.history.capacity(),
            last_confirmed_tick: self.reconciler.last_confirmed_tick(),
            last_predicted_tick: self.last_tick,
        }
    }

    /// Get access to the history
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Last tick a prediction step ran for
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Last confirmation that was evaluated
    pub fn last_confirmed_tick(&self) -> Option<Tick> {
        self.reconciler.last_confirmed_tick()
    }

    /// Number of ticks predicted ahead of the last confirmation
    pub fn prediction_frames(&self) -> u64 {
        self.history_snapshot().ticks_in_flight()
    }

    /// Prediction accuracy counters
    pub fn stats(&self) -> &ReconcileStats {
        self.reconciler.stats()
    }

    /// Send cadence monitor
    pub fn send_rate(&self) -> &SendRateMonitor {
        &self.send_rate
    }

    /// Active configuration
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// The movement chain
    pub fn chain(&self) -> &MovementChain {
        &self.chain
    }
}

impl<H: MovementHistory> fmt::Debug for PredictionEngine<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("last_tick", &self.last_tick)
            .field("last_confirmed_tick", &self.reconciler.last_confirmed_tick())
            .field("transform", &self.transform)
            .field("history_len", &self.history.len())
            .field("chain", &self.chain)
            .finish()
    }
}
