//! Dynamic rigid obstacles.
//!
//! A small fixed set of axis-aligned scaled boxes, refreshed once per tick by
//! the caller and read-only to the solver. Only the granular contact model
//! responds to them; fluid particles ignore obstacles entirely.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One axis-aligned box collider. `scale` holds half-extents.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,
}

impl Obstacle {
    pub fn new(position: Vec3, scale: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            scale,
            velocity,
        }
    }

    /// Componentwise normalized offset of `point` from the box center.
    /// Inside the box iff every component has absolute value below 1.
    #[inline]
    pub fn normalized_offset(&self, point: Vec3) -> Vec3 {
        (point - self.position) / self.scale.max(Vec3::splat(1e-6))
    }

    /// Is `point` strictly inside the box?
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        let q = self.normalized_offset(point).abs();
        q.x < 1.0 && q.y < 1.0 && q.z < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let obstacle = Obstacle::new(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5), Vec3::ZERO);
        assert!(obstacle.contains(Vec3::new(1.0, 0.2, -0.3)));
        assert!(!obstacle.contains(Vec3::new(1.6, 0.0, 0.0)));
        assert!(!obstacle.contains(Vec3::ZERO));
    }

    #[test]
    fn test_surface_point_is_outside() {
        let obstacle = Obstacle::new(Vec3::ZERO, Vec3::splat(1.0), Vec3::ZERO);
        assert!(!obstacle.contains(Vec3::new(1.0, 0.0, 0.0)));
    }
}
