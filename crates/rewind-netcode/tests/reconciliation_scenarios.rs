//! End-to-end reconciliation scenarios driven through the prediction engine

use rewind_core::{Clock, InputRecord, MovementHistory, PredictionConfig, Transform, Vec3};
use rewind_netcode::{
    ConfirmationQueue, MovementProcessor, MovementStep, PredictionEngine, ReconcileOutcome,
    ServerConfirmation,
};
use rewind_rollback_buffer::RollbackBuffer;

/// One unit along +X per tick while forward is held
struct StepForward;

impl MovementProcessor for StepForward {
    fn apply(&mut self, transform: Transform, step: &MovementStep<'_>) -> Transform {
        if step.input.forward {
            transform.translated(Vec3::X)
        } else {
            transform
        }
    }

    fn name(&self) -> &'static str {
        "step_forward"
    }
}

fn engine_at(x: f32) -> PredictionEngine<RollbackBuffer> {
    let config = PredictionConfig::default().with_tick_duration(0.1);
    let history = RollbackBuffer::new(config.history_capacity);
    let mut engine =
        PredictionEngine::with_transform(history, config, Transform::at(Vec3::new(x, 0.0, 0.0)))
            .unwrap();
    engine.push_processor(StepForward);
    engine
}

/// Step `count` ticks holding forward, advancing the clock after each
fn walk_forward(
    engine: &mut PredictionEngine<RollbackBuffer>,
    clock: &mut Clock,
    sent: &mut Vec<InputRecord>,
    count: u64,
) {
    for _ in 0..count {
        engine.add_input(true, false, false, false, false, false, 0.0, 0.0);
        engine.step(&*clock, sent);
        clock.advance();
    }
}

#[test]
fn misprediction_replays_to_present() {
    // Ticks 96..=103 predict x = 6..=13
    let mut clock = Clock::starting_at(96, 0.1);
    let mut engine = engine_at(5.0);
    let mut sent = Vec::new();
    walk_forward(&mut engine, &mut clock, &mut sent, 8);

    assert_eq!(engine.last_tick(), Some(103));
    assert_eq!(
        engine.history().get_position(100),
        Some(Vec3::new(10.0, 0.0, 0.0))
    );

    let confirmation = ServerConfirmation::new(100, Vec3::new(10.5, 0.0, 0.0), 0.0);
    let outcome = engine.on_confirmation(&confirmation, &mut clock);

    assert_eq!(
        outcome,
        ReconcileOutcome::Replayed {
            tick: 100,
            distance: 0.5,
            replayed: 3,
        }
    );
    let history = engine.history();
    assert_eq!(history.get_position(100), Some(Vec3::new(10.5, 0.0, 0.0)));
    assert_eq!(history.get_position(101), Some(Vec3::new(11.5, 0.0, 0.0)));
    assert_eq!(history.get_position(102), Some(Vec3::new(12.5, 0.0, 0.0)));
    assert_eq!(history.get_position(103), Some(Vec3::new(13.5, 0.0, 0.0)));
    assert_eq!(history.tick_range(), Some((99, 103)));
    assert_eq!(engine.transform().position, Vec3::new(13.5, 0.0, 0.0));

    // Prediction carries on from the corrected state
    walk_forward(&mut engine, &mut clock, &mut sent, 1);
    assert_eq!(engine.transform().position, Vec3::new(14.5, 0.0, 0.0));
    assert_eq!(engine.stats().mispredictions, 1);
    assert_eq!(engine.stats().replayed_ticks, 3);
}

#[test]
fn confirmation_within_tolerance_leaves_history() {
    let mut clock = Clock::starting_at(96, 0.1);
    let mut engine = engine_at(5.0);
    let mut sent = Vec::new();
    walk_forward(&mut engine, &mut clock, &mut sent, 8);

    let before: Vec<_> = (99..=103)
        .map(|tick| engine.history().get_position(tick))
        .collect();

    let confirmation = ServerConfirmation::new(100, Vec3::new(10.05, 0.0, 0.0), 0.0);
    let outcome = engine.on_confirmation(&confirmation, &mut clock);

    assert!(matches!(outcome, ReconcileOutcome::Confirmed { tick: 100, .. }));
    let after: Vec<_> = (99..=103)
        .map(|tick| engine.history().get_position(tick))
        .collect();
    assert_eq!(before, after);
    assert_eq!(engine.transform().position, Vec3::new(13.0, 0.0, 0.0));
    assert_eq!(engine.history().get_input(100), None);
}

#[test]
fn lagged_and_reordered_confirmations() {
    let mut clock = Clock::new(0.1);
    let mut engine = engine_at(0.0);
    let mut sent = Vec::new();
    walk_forward(&mut engine, &mut clock, &mut sent, 10);

    let queue = ConfirmationQueue::new();
    let network = queue.clone();
    network.push(ServerConfirmation::new(4, Vec3::new(5.0, 0.0, 0.0), 0.0));
    network.push(ServerConfirmation::new(2, Vec3::new(9.0, 0.0, 0.0), 0.0));
    network.push(ServerConfirmation::new(6, Vec3::new(7.0, 0.0, 0.0), 0.0));

    let outcomes = engine.drain_confirmations(&queue, &mut clock);

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0], ReconcileOutcome::Confirmed { tick: 4, .. }));
    assert_eq!(outcomes[1], ReconcileOutcome::Stale { tick: 2 });
    assert!(matches!(outcomes[2], ReconcileOutcome::Confirmed { tick: 6, .. }));
    assert_eq!(engine.last_confirmed_tick(), Some(6));
    assert_eq!(engine.prediction_frames(), 3);
    assert!(queue.is_empty());
}

#[test]
fn server_disagreement_accumulates_stats() {
    let mut clock = Clock::new(0.1);
    let mut engine = engine_at(0.0);
    let mut sent = Vec::new();
    walk_forward(&mut engine, &mut clock, &mut sent, 6);

    // Server pushes the character sideways twice
    let first = ServerConfirmation::new(2, Vec3::new(3.0, 0.0, 2.0), 0.0);
    let second = ServerConfirmation::new(4, Vec3::new(5.0, 0.0, 4.0), 0.0);
    engine.on_confirmation(&first, &mut clock);
    engine.on_confirmation(&second, &mut clock);

    let stats = engine.stats();
    assert_eq!(stats.confirmations, 2);
    assert_eq!(stats.mispredictions, 2);
    assert_eq!(stats.max_error_distance, 2.0);
    assert_eq!(stats.replayed_ticks, 3 + 1);
    assert_eq!(engine.transform().position, Vec3::new(6.0, 0.0, 4.0));
    assert_eq!(sent.len(), 6);
}
