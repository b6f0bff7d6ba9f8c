//! Semi-implicit Euler integration and domain-boundary response.
//!
//! Unit mass is assumed throughout, so force and acceleration are
//! interchangeable. The speed clamp after the velocity update is a stability
//! safeguard against stiff penalty forces. Boundary handling runs per axis
//! independently; a particle in a corner may reflect on two or three axes in
//! the same step, which is accepted.

use glam::Vec3;
use rayon::prelude::*;

use crate::params::SimParams;
use crate::particle::Particles;

/// Fluid wall bounce keeps half the offending velocity component. Sand uses
/// its own per-particle restitution instead; the asymmetry is inherited
/// behavior, kept deliberately.
const FLUID_WALL_RESTITUTION: f32 = 0.5;

/// Apply accumulated forces and advance positions, then resolve wall
/// contacts. The only phase that writes position/velocity.
pub(crate) fn integrate(particles: &mut Particles, forces: &[Vec3], params: &SimParams, dt: f32) {
    let (bounds_min, bounds_max) = params.bounds();
    let max_speed = params.max_speed;

    particles
        .list
        .par_iter_mut()
        .zip(forces.par_iter())
        .for_each(|(p, &force)| {
            p.velocity += force * dt;

            let speed = p.velocity.length();
            if speed > max_speed {
                p.velocity *= max_speed / speed;
            }

            p.position += p.velocity * dt;

            let restitution = if p.kind.is_sand() {
                p.props.restitution
            } else {
                FLUID_WALL_RESTITUTION
            };

            for axis in 0..3 {
                if p.position[axis] < bounds_min[axis] {
                    p.position[axis] = bounds_min[axis];
                    p.velocity[axis] = -p.velocity[axis] * restitution;
                } else if p.position[axis] > bounds_max[axis] {
                    p.position[axis] = bounds_max[axis];
                    p.velocity[axis] = -p.velocity[axis] * restitution;
                }
            }
        });
}
