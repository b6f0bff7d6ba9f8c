//! Density and force evaluation, type-dispatched per particle.
//!
//! Two data-parallel passes per substep. The density pass fills the SPH
//! density fields for fluid particles; the force pass accumulates one force
//! vector per particle, branching on the particle kind: SPH pressure +
//! viscosity for fluid, penalty contacts + friction damping + obstacle
//! response for sand. Both passes only read other particles' state, so lanes
//! are free of write races; results land in per-pass buffers owned by the
//! driver and applied behind a join.
//!
//! Mixed-type coupling happens through the granular contact path, which
//! needs only positions. The SPH sums skip sand neighbors because sand
//! density is undefined by contract.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use rayon::prelude::*;

use crate::kernels::KernelCoeffs;
use crate::neighbors::{self, NeighborBuffer};
use crate::obstacle::Obstacle;
use crate::params::SimParams;
use crate::particle::{Particle, Particles};
use crate::spatial_hash::SpatialHash;

/// Minimum distance for any direction-dependent term. Pairs closer than this
/// contribute no directional force (bounded and symmetric by construction).
pub(crate) const DIST_EPS: f32 = 1e-6;
/// Guard on density denominators.
pub(crate) const DENSITY_EPS: f32 = 1e-6;

/// Recompute `density` / `near_density` for every fluid particle.
///
/// Results are staged in `densities` / `near_densities` and applied to the
/// store behind the parallel join, so no lane ever reads a half-updated
/// density.
pub(crate) fn density_pass(
    particles: &mut Particles,
    hash: &SpatialHash,
    coeffs: &KernelCoeffs,
    densities: &mut [f32],
    near_densities: &mut [f32],
    truncated: &AtomicU64,
) {
    {
        let shared: &Particles = particles;
        densities
            .par_iter_mut()
            .zip(near_densities.par_iter_mut())
            .enumerate()
            .for_each(|(i, (density, near_density))| {
                let p = &shared.list[i];
                if p.kind.is_sand() {
                    *density = 0.0;
                    *near_density = 0.0;
                    return;
                }

                let mut buf = NeighborBuffer::new();
                neighbors::gather(hash, shared, p.position, i, coeffs.h, &mut buf);
                if buf.truncated() > 0 {
                    truncated.fetch_add(buf.truncated() as u64, Ordering::Relaxed);
                }

                let mut rho = 0.0;
                let mut rho_near = 0.0;
                for &j in buf.as_slice() {
                    let q = &shared.list[j as usize];
                    if q.kind.is_sand() {
                        continue;
                    }
                    let dist = (p.position - q.position).length();
                    rho += coeffs.poly6(dist);
                    rho_near += coeffs.poly6_near(dist);
                }
                *density = rho;
                *near_density = rho_near;
            });
    }

    particles
        .list
        .par_iter_mut()
        .zip(densities.par_iter())
        .zip(near_densities.par_iter())
        .for_each(|((p, &rho), &rho_near)| {
            if !p.kind.is_sand() {
                p.density = rho;
                p.near_density = rho_near;
            }
        });
}

/// Accumulate per-particle forces into `forces`.
///
/// `forces` arrives seeded with external forces (gravity); this pass only
/// adds the type-dispatched interaction terms.
pub(crate) fn force_pass(
    particles: &Particles,
    hash: &SpatialHash,
    params: &SimParams,
    coeffs: &KernelCoeffs,
    obstacles: &[Obstacle],
    forces: &mut [Vec3],
    truncated: &AtomicU64,
) {
    forces.par_iter_mut().enumerate().for_each(|(i, force)| {
        let p = &particles.list[i];
        let mut buf = NeighborBuffer::new();

        let contribution = if p.kind.is_sand() {
            neighbors::gather(
                hash,
                particles,
                p.position,
                i,
                params.stacking_distance,
                &mut buf,
            );
            sand_force(p, particles, &buf, params, obstacles)
        } else {
            neighbors::gather(hash, particles, p.position, i, coeffs.h, &mut buf);
            fluid_force(p, particles, &buf, params, coeffs)
        };

        if buf.truncated() > 0 {
            truncated.fetch_add(buf.truncated() as u64, Ordering::Relaxed);
        }
        *force += contribution;
    });
}

/// SPH pressure + viscosity for one fluid particle.
///
/// Pressure is linear in the density deviation from rest, with a purely
/// repulsive near-pressure term (no rest subtraction). Each neighbor
/// contributes the symmetrized pressure `(p_i + p_j) / 2` along the spiky
/// gradient from j to i; the whole accumulation is a pure sum, so neighbor
/// order does not matter.
fn fluid_force(
    p: &Particle,
    particles: &Particles,
    buf: &NeighborBuffer,
    params: &SimParams,
    coeffs: &KernelCoeffs,
) -> Vec3 {
    let k_i = params.pressure_multiplier * p.props.pressure_multiplier;
    let pressure_i = k_i * (p.density - params.target_density);
    let near_pressure_i = params.near_pressure_multiplier * p.near_density;

    let mut accum = Vec3::ZERO;
    for &j in buf.as_slice() {
        let q = &particles.list[j as usize];
        if q.kind.is_sand() {
            continue;
        }

        let to_i = p.position - q.position;
        let dist = to_i.length();

        if dist > DIST_EPS {
            let k_j = params.pressure_multiplier * q.props.pressure_multiplier;
            let pressure_j = k_j * (q.density - params.target_density);
            let near_pressure_j = params.near_pressure_multiplier * q.near_density;

            let shared = 0.5 * (pressure_i + pressure_j);
            let shared_near = 0.5 * (near_pressure_i + near_pressure_j);
            let dir = to_i / dist;
            accum += dir * (shared * coeffs.spiky_grad(dist) + shared_near * coeffs.spiky_grad_near(dist));
        }

        // Velocity diffusion. Well-defined even at zero distance.
        accum += (q.velocity - p.velocity)
            * (coeffs.viscosity_laplacian(dist) * p.props.viscosity * params.viscosity_strength);
    }

    accum / (p.density + DENSITY_EPS)
}

/// Penalty contact + bulk friction + obstacle response for one sand particle.
///
/// A single-pass, branch-light penalty model (not an exact constraint solve):
/// each neighbor closer than the stacking distance pushes back proportionally
/// to penetration, with the particle's friction coefficient as a stiffness
/// proxy.
fn sand_force(
    p: &Particle,
    particles: &Particles,
    buf: &NeighborBuffer,
    params: &SimParams,
    obstacles: &[Obstacle],
) -> Vec3 {
    let mut f = Vec3::ZERO;

    for &j in buf.as_slice() {
        let q = &particles.list[j as usize];
        let to_i = p.position - q.position;
        let dist = to_i.length();
        if dist >= params.stacking_distance || dist <= DIST_EPS {
            continue;
        }
        let penetration = params.stacking_distance - dist;
        f += (to_i / dist) * (penetration * params.contact_stiffness * p.props.friction);
    }

    // Bulk energy loss: bleed off a fraction of own velocity each step.
    f -= p.velocity * params.sand_friction_damping;

    for obstacle in obstacles {
        f += obstacle_response(p, obstacle, params);
    }

    f
}

/// Response against one rigid box: penetration-proportional push along the
/// axis of least penetration, plus tangential friction against the
/// obstacle's own velocity. O(particles x obstacles) overall; the obstacle
/// count is assumed small.
fn obstacle_response(p: &Particle, obstacle: &Obstacle, params: &SimParams) -> Vec3 {
    let q = obstacle.normalized_offset(p.position);
    let qa = q.abs();
    if qa.x >= 1.0 || qa.y >= 1.0 || qa.z >= 1.0 {
        return Vec3::ZERO;
    }

    // Penetration depth per axis in world units; exit along the shallowest.
    let depths = (Vec3::ONE - qa) * obstacle.scale;
    let (axis, depth) = if depths.x <= depths.y && depths.x <= depths.z {
        (0, depths.x)
    } else if depths.y <= depths.z {
        (1, depths.y)
    } else {
        (2, depths.z)
    };

    let mut normal = Vec3::ZERO;
    normal[axis] = if q[axis] >= 0.0 { 1.0 } else { -1.0 };

    let mut f = normal * (depth * params.contact_stiffness * p.props.friction);

    let relative = p.velocity - obstacle.velocity;
    let tangential = relative - normal * relative.dot(normal);
    f -= tangential * (p.props.friction * params.sand_friction_damping);

    f
}
