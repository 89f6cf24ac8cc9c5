//! Lossy link demo
//!
//! Runs a predicting client against an in-process server that lags behind,
//! reorders and duplicates its confirmations, and now and then pushes the
//! character somewhere the client did not expect.
//!
//! ```text
//! cargo run -p lossy_link [config.ron]
//! RUST_LOG=rewind_netcode=trace cargo run -p lossy_link
//! ```

use rewind_core::{
    Clock, InputRecord, MovementHistory, PredictionConfig, Tick, TickSource, Transform, Vec3,
};
use rewind_netcode::{
    processors::{Gravity, Jump, Walk},
    ConfirmationQueue, MovementChain, MovementProcessor, PredictionEngine, ReconcileOutcome,
    ServerConfirmation,
};
use rewind_rollback_buffer::RollbackBuffer;
use std::collections::VecDeque;
use std::env;
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, info, warn};

/// Ticks to simulate
const TICKS: Tick = 600;
/// One-way latency of confirmations, in ticks
const LAG: Tick = 6;
/// Every Nth confirmation swaps places with the next one
const REORDER_EVERY: u64 = 9;
/// Every Nth confirmation is delivered twice
const DUPLICATE_EVERY: u64 = 13;

fn movement_processors() -> Vec<Box<dyn MovementProcessor>> {
    vec![
        Box::new(Walk::default()),
        Box::new(Jump::default()),
        Box::new(Gravity::default()),
    ]
}

/// Authoritative side of the link
struct Server {
    inputs: Receiver<InputRecord>,
    chain: MovementChain,
    history: RollbackBuffer,
    transform: Transform,
    tick_duration: f32,
    velocity_lookback: u64,
    in_flight: VecDeque<(Tick, ServerConfirmation)>,
    delivered: u64,
}

impl Server {
    fn new(inputs: Receiver<InputRecord>, config: &PredictionConfig) -> Self {
        Self {
            inputs,
            chain: MovementChain::from_processors(movement_processors()),
            history: RollbackBuffer::new(config.history_capacity),
            transform: Transform::default(),
            tick_duration: config.tick_duration,
            velocity_lookback: config.velocity_lookback,
            in_flight: VecDeque::new(),
            delivered: 0,
        }
    }

    /// Simulate every input that has arrived
    fn pump(&mut self) {
        while let Ok(input) = self.inputs.try_recv() {
            let tick = input.tick;
            let velocity = self
                .history
                .velocity(tick, self.velocity_lookback, self.tick_duration);
            self.transform = self.chain.apply(
                self.transform,
                &input,
                tick,
                velocity,
                self.tick_duration,
            );

            // A gust the client knows nothing about
            if (100..104).contains(&(tick % 120)) {
                self.transform = self.transform.translated(Vec3::new(0.25, 0.0, 0.0));
            }

            self.history.record(tick, input, self.transform.position);
            let keep_from = tick.saturating_sub(self.velocity_lookback + 8);
            self.history.evict_before(keep_from);
            self.chain.clean(keep_from);

            let confirmation = ServerConfirmation::new(tick, self.transform.position, 0.0);
            self.in_flight.push_back((tick + LAG, confirmation));
        }
    }

    /// Hand over confirmations whose latency has elapsed
    fn deliver(&mut self, now: Tick, queue: &ConfirmationQueue) {
        let mut due = Vec::new();
        while let Some((deliver_at, _)) = self.in_flight.front() {
            if *deliver_at > now {
                break;
            }
            if let Some((_, confirmation)) = self.in_flight.pop_front() {
                due.push(confirmation);
            }
        }

        let mut i = 0;
        while i < due.len() {
            self.delivered += 1;
            if self.delivered % REORDER_EVERY == 0 && i + 1 < due.len() {
                due.swap(i, i + 1);
            }
            if self.delivered % DUPLICATE_EVERY == 0 {
                queue.push(due[i]);
            }
            queue.push(due[i]);
            i += 1;
        }
    }
}

/// Scripted player: runs forward, turns slowly, jumps every so often
fn play(engine: &mut PredictionEngine<RollbackBuffer>, tick: Tick) {
    let yaw = (tick as f32 * 0.75) % 360.0 - 180.0;
    let jump = tick % 90 == 45;
    let sprint = (tick / 200) % 2 == 1;
    engine.add_input(true, false, false, tick % 60 < 10, jump, sprint, yaw, -5.0);
}

fn main() -> rewind_netcode::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading prediction config");
            PredictionConfig::from_ron_file(path)?
        }
        None => PredictionConfig::default(),
    };
    info!(?config, "starting lossy link");

    let (input_tx, input_rx) = mpsc::channel();
    let mut server = Server::new(input_rx, &config);
    let confirmations = ConfirmationQueue::new();

    let mut clock = Clock::from_config(&config)?;
    let history = RollbackBuffer::new(config.history_capacity);
    let mut engine = PredictionEngine::new(history, config)?;
    engine.set_movement_processors(movement_processors());

    let mut sink = input_tx;
    for _ in 0..TICKS {
        let now = clock.current_tick();
        play(&mut engine, now);
        engine.step(&clock, &mut sink);

        server.pump();
        server.deliver(now, &confirmations);

        for outcome in engine.drain_confirmations(&confirmations, &mut clock) {
            match outcome {
                ReconcileOutcome::Stale { tick } => debug!(tick, "server repeated itself"),
                ReconcileOutcome::ReplayAborted { .. } => {
                    if let Some(err) = outcome.error() {
                        warn!(%err, "reconciliation incomplete");
                    }
                }
                _ => {}
            }
        }

        clock.advance();
    }

    let stats = engine.stats();
    let snapshot = engine.history_snapshot();
    info!(
        predictions = stats.predictions,
        confirmations = stats.confirmations,
        mispredictions = stats.mispredictions,
        stale = stats.stale,
        replayed_ticks = stats.replayed_ticks,
        avg_error = stats.avg_error_distance,
        max_error = stats.max_error_distance,
        ratio = stats.misprediction_ratio(),
        "link closed"
    );
    info!(
        in_flight = snapshot.ticks_in_flight(),
        buffered = snapshot.entries.len(),
        send_rate = engine.send_rate().average_rate(),
        client = ?engine.transform().position,
        server = ?server.transform.position,
        "final state"
    );

    Ok(())
}
