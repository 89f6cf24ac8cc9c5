//! Stock movement processors
//!
//! A typical character chain is `[Walk, Jump, Gravity]`: walk moves on the
//! horizontal plane, jump lifts off the ground, gravity integrates the
//! vertical velocity estimate and lands the character.

use crate::processor::{MovementProcessor, MovementStep};
use rewind_core::{Tick, Transform, Vec3};
use std::collections::BTreeSet;

/// Height tolerance for "standing on the ground"
const GROUND_EPSILON: f32 = 1e-3;

/// Horizontal movement from the directional intents
///
/// Directions are relative to the camera yaw: yaw 0 faces +Z, yaw 90 faces +X.
#[derive(Debug, Clone)]
pub struct Walk {
    /// Units per second
    pub speed: f32,
    /// Speed multiplier while sprinting
    pub sprint_multiplier: f32,
}

impl Walk {
    pub fn new(speed: f32, sprint_multiplier: f32) -> Self {
        Self {
            speed,
            sprint_multiplier,
        }
    }

    /// Unit direction of travel, or zero when intents cancel out
    fn direction(step: &MovementStep<'_>) -> Vec3 {
        let input = step.input;
        let yaw = input.yaw_degrees().to_radians();
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());

        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += forward;
        }
        if input.back {
            direction -= forward;
        }
        if input.right {
            direction += right;
        }
        if input.left {
            direction -= right;
        }
        direction.normalize_or_zero()
    }
}

impl Default for Walk {
    fn default() -> Self {
        Self::new(5.0, 1.8)
    }
}

impl MovementProcessor for Walk {
    fn apply(&mut self, transform: Transform, step: &MovementStep<'_>) -> Transform {
        let speed = if step.input.sprint {
            self.speed * self.sprint_multiplier
        } else {
            self.speed
        };

        Transform {
            yaw: step.input.yaw_degrees(),
            ..transform.translated(Self::direction(step) * speed * step.tick_duration)
        }
    }

    fn name(&self) -> &'static str {
        "walk"
    }
}

/// Constant downward acceleration with a flat ground plane
#[derive(Debug, Clone)]
pub struct Gravity {
    /// Units per second squared
    pub acceleration: f32,
    /// Height of the ground plane
    pub ground_height: f32,
}

impl Gravity {
    pub fn new(acceleration: f32, ground_height: f32) -> Self {
        Self {
            acceleration,
            ground_height,
        }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(20.0, 0.0)
    }
}

impl MovementProcessor for Gravity {
    fn apply(&mut self, transform: Transform, step: &MovementStep<'_>) -> Transform {
        let mut position = transform.position;
        if position.y <= self.ground_height + GROUND_EPSILON && step.velocity.y <= 0.0 {
            position.y = self.ground_height;
            return Transform {
                position,
                ..transform
            };
        }

        let vertical = step.velocity.y - self.acceleration * step.tick_duration;
        position.y = (position.y + vertical * step.tick_duration).max(self.ground_height);
        Transform {
            position,
            ..transform
        }
    }

    fn name(&self) -> &'static str {
        "gravity"
    }
}

/// Jump impulse with a cooldown
///
/// Remembers the ticks at which jumps started. A replayed tick first forgets
/// every start at or after itself, so the record is rebuilt exactly as the
/// replay proceeds.
#[derive(Debug, Clone)]
pub struct Jump {
    /// Upward speed at take-off, units per second
    pub impulse: f32,
    /// Minimum ticks between two jump starts
    pub cooldown_ticks: u64,
    /// Height of the ground plane
    pub ground_height: f32,
    starts: BTreeSet<Tick>,
}

impl Jump {
    pub fn new(impulse: f32, cooldown_ticks: u64, ground_height: f32) -> Self {
        Self {
            impulse,
            cooldown_ticks,
            ground_height,
            starts: BTreeSet::new(),
        }
    }

    /// Ticks at which a jump started, oldest first
    pub fn starts(&self) -> impl Iterator<Item = Tick> + '_ {
        self.starts.iter().copied()
    }

    fn on_cooldown(&self, tick: Tick) -> bool {
        self.starts
            .range(..tick)
            .next_back()
            .is_some_and(|last| tick - last < self.cooldown_ticks)
    }
}

impl Default for Jump {
    fn default() -> Self {
        Self::new(7.0, 20, 0.0)
    }
}

impl MovementProcessor for Jump {
    fn apply(&mut self, transform: Transform, step: &MovementStep<'_>) -> Transform {
        // Anything at or after this tick is being rewritten
        self.starts.retain(|t| *t < step.tick);

        let grounded = transform.position.y <= self.ground_height + GROUND_EPSILON;
        if !step.input.jump || !grounded || self.on_cooldown(step.tick) {
            return transform;
        }

        self.starts.insert(step.tick);
        transform.translated(Vec3::Y * self.impulse * step.tick_duration)
    }

    fn clean(&mut self, tick: Tick) {
        // Starts inside the cooldown window still gate replayed ticks
        let keep_from = tick.saturating_sub(self.cooldown_ticks);
        self.starts.retain(|t| *t >= keep_from);
    }

    fn name(&self) -> &'static str {
        "jump"
    }
}
