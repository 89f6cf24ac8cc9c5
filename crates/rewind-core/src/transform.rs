//! Character transform

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Position and facing of the locally controlled character
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// Facing around the up axis, in degrees
    pub yaw: f32,
}

impl Transform {
    /// Create a transform at a position, facing yaw 0
    pub fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }

    /// Return a copy moved by `delta`
    pub fn translated(self, delta: Vec3) -> Self {
        Self {
            position: self.position + delta,
            ..self
        }
    }

    /// Euclidean distance between two positions
    pub fn distance_to(&self, position: Vec3) -> f32 {
        self.position.distance(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translated() {
        let t = Transform::at(Vec3::new(1.0, 2.0, 3.0)).translated(Vec3::X);
        assert_eq!(t.position, Vec3::new(2.0, 2.0, 3.0));
        assert_eq!(t.yaw, 0.0);
    }

    #[test]
    fn test_distance() {
        let t = Transform::at(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(t.distance_to(Vec3::new(10.5, 0.0, 0.0)), 0.5);
    }
}
