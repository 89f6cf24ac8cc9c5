//! Movement processor chain
//!
//! A processor turns one tick's input into movement. The chain applies its
//! processors in a fixed order; the same chain is used for live prediction
//! and for replay, so the output must depend only on the arguments.
//!
//! Processors that keep shadow state (for example, when the last jump
//! started) must key it by tick and rewrite it when a tick is replayed, so
//! that replaying a tick range reproduces the same result. `clean` is called
//! in lockstep with history eviction.

use rewind_core::{InputRecord, Tick, Transform, Vec3};
use std::fmt;

/// Everything a processor may read besides the transform
#[derive(Debug, Clone, Copy)]
pub struct MovementStep<'a> {
    /// Input captured for this tick
    pub input: &'a InputRecord,
    /// The tick being simulated
    pub tick: Tick,
    /// Velocity estimate going into this tick
    pub velocity: Vec3,
    /// Duration of one tick in seconds
    pub tick_duration: f32,
}

/// A deterministic movement stage
pub trait MovementProcessor {
    /// Produce the transform after this stage
    fn apply(&mut self, transform: Transform, step: &MovementStep<'_>) -> Transform;

    /// History before `tick` has been discarded
    fn clean(&mut self, _tick: Tick) {}

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Ordered list of movement processors
#[derive(Default)]
pub struct MovementChain {
    processors: Vec<Box<dyn MovementProcessor>>,
}

impl MovementChain {
    /// Create an empty chain (movement is the identity)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain from processors, applied in the given order
    pub fn from_processors(processors: Vec<Box<dyn MovementProcessor>>) -> Self {
        Self { processors }
    }

    /// Append a processor to the end of the chain
    pub fn push(&mut self, processor: impl MovementProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }

    /// Replace all processors
    pub fn replace(&mut self, processors: Vec<Box<dyn MovementProcessor>>) {
        self.processors = processors;
    }

    /// Run every processor in order
    pub fn apply(
        &mut self,
        transform: Transform,
        input: &InputRecord,
        tick: Tick,
        velocity: Vec3,
        tick_duration: f32,
    ) -> Transform {
        let step = MovementStep {
            input,
            tick,
            velocity,
            tick_duration,
        };
        self.processors
            .iter_mut()
            .fold(transform, |current, processor| processor.apply(current, &step))
    }

    /// Notify every processor that history before `tick` is gone
    pub fn clean(&mut self, tick: Tick) {
        for processor in &mut self.processors {
            processor.clean(tick);
        }
    }

    /// Number of processors
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if the chain has no processors
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor names in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }
}

impl fmt::Debug for MovementChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementChain")
            .field("processors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Offset(Vec3);

    impl MovementProcessor for Offset {
        fn apply(&mut self, transform: Transform, _step: &MovementStep<'_>) -> Transform {
            transform.translated(self.0)
        }

        fn name(&self) -> &'static str {
            "offset"
        }
    }

    struct Scale(f32);

    impl MovementProcessor for Scale {
        fn apply(&mut self, transform: Transform, _step: &MovementStep<'_>) -> Transform {
            Transform {
                position: transform.position * self.0,
                ..transform
            }
        }

        fn name(&self) -> &'static str {
            "scale"
        }
    }

    struct CleanCounter {
        cleaned: Rc<RefCell<Vec<Tick>>>,
    }

    impl MovementProcessor for CleanCounter {
        fn apply(&mut self, transform: Transform, _step: &MovementStep<'_>) -> Transform {
            transform
        }

        fn clean(&mut self, tick: Tick) {
            self.cleaned.borrow_mut().push(tick);
        }

        fn name(&self) -> &'static str {
            "clean_counter"
        }
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = MovementChain::new();
        let start = Transform::at(Vec3::new(1.0, 2.0, 3.0));
        let input = InputRecord::idle(0);

        assert_eq!(chain.apply(start, &input, 0, Vec3::ZERO, 0.1), start);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_processors_apply_in_order() {
        let input = InputRecord::idle(0);
        let start = Transform::at(Vec3::ONE);

        let mut offset_first = MovementChain::new();
        offset_first.push(Offset(Vec3::X));
        offset_first.push(Scale(2.0));
        assert_eq!(
            offset_first.apply(start, &input, 0, Vec3::ZERO, 0.1).position,
            Vec3::new(4.0, 2.0, 2.0)
        );

        let mut scale_first = MovementChain::new();
        scale_first.push(Scale(2.0));
        scale_first.push(Offset(Vec3::X));
        assert_eq!(
            scale_first.apply(start, &input, 0, Vec3::ZERO, 0.1).position,
            Vec3::new(3.0, 2.0, 2.0)
        );
        assert_eq!(scale_first.names(), vec!["scale", "offset"]);
    }

    #[test]
    fn test_replace() {
        let mut chain = MovementChain::new();
        chain.push(Offset(Vec3::X));
        chain.replace(vec![Box::new(Scale(3.0)), Box::new(Scale(3.0))]);

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.names(), vec!["scale", "scale"]);
    }

    #[test]
    fn test_clean_reaches_every_processor() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        let mut chain = MovementChain::new();
        chain.push(CleanCounter {
            cleaned: Rc::clone(&first),
        });
        chain.push(Offset(Vec3::X));
        chain.push(CleanCounter {
            cleaned: Rc::clone(&second),
        });

        chain.clean(41);
        chain.clean(42);

        assert_eq!(*first.borrow(), vec![41, 42]);
        assert_eq!(*second.borrow(), vec![41, 42]);
    }
}
