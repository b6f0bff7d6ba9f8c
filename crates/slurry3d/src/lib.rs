//! Unified SPH + granular particle solver.
//!
//! One mixed-type particle population — incompressible fluid (SPH) and
//! granular sand (penalty contacts) — shares a single domain, a single
//! spatial hash, and a single four-phase step loop, so the two materials can
//! collide and interact. The solver is a fixed-length synchronous per-tick
//! computation: no internal blocking, cancellation, or timeouts.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use slurry3d::{MaterialProps, ParticleKind, SimParams, Simulation, SpawnRecord};
//!
//! let spawn: Vec<SpawnRecord> = (0..8)
//!     .map(|i| {
//!         SpawnRecord::new(
//!             Vec3::new(0.0, i as f32 * 0.1, 0.0),
//!             Vec3::ZERO,
//!             ParticleKind::Fluid,
//!             MaterialProps::fluid(0.3, 1.0),
//!         )
//!     })
//!     .collect();
//!
//! let mut sim = Simulation::new(SimParams::default(), &spawn).unwrap();
//! sim.step();
//! assert_eq!(sim.particle_count(), 8);
//! ```

pub mod error;
pub mod forces;
pub mod integrate;
pub mod kernels;
pub mod neighbors;
pub mod obstacle;
pub mod params;
pub mod particle;
pub mod spatial_hash;

pub use error::SimError;
pub use glam::Vec3;
pub use kernels::KernelCoeffs;
pub use neighbors::{NeighborBuffer, MAX_NEIGHBORS};
pub use obstacle::Obstacle;
pub use params::SimParams;
pub use particle::{MaterialProps, Particle, ParticleKind, ParticleView, Particles, SpawnRecord};
pub use spatial_hash::SpatialHash;

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

/// The solver driver: owns the particle store, the rebuilt-every-step
/// spatial index, and all per-phase scratch buffers (pre-sized once, reused
/// every tick).
pub struct Simulation {
    params: SimParams,
    coeffs: KernelCoeffs,
    particles: Particles,
    hash: SpatialHash,
    obstacles: Vec<Obstacle>,

    // Per-phase buffers; each phase owns exclusive write access to its own.
    forces: Vec<glam::Vec3>,
    densities: Vec<f32>,
    near_densities: Vec<f32>,

    /// True neighbors dropped to the per-particle cap, accumulated per tick.
    truncated_neighbors: AtomicU64,
    tick: u64,
}

impl Simulation {
    /// Validate configuration, consume the spawn feed, and allocate every
    /// buffer up front. On error nothing is half-built: you get `Err`, not a
    /// partially initialized solver.
    pub fn new(params: SimParams, spawn: &[SpawnRecord]) -> Result<Self, SimError> {
        params.validate()?;
        if spawn.is_empty() {
            return Err(SimError::EmptyPopulation);
        }

        let particles = Particles::from_spawn(spawn);
        let n = particles.len();

        Ok(Self {
            params,
            coeffs: KernelCoeffs::new(params.smoothing_radius),
            hash: SpatialHash::with_capacity(n),
            obstacles: Vec::new(),
            forces: vec![glam::Vec3::ZERO; n],
            densities: vec![0.0; n],
            near_densities: vec![0.0; n],
            truncated_neighbors: AtomicU64::new(0),
            tick: 0,
            particles,
        })
    }

    /// Advance one tick: `iterations_per_tick` substeps of
    /// `dt / iterations_per_tick` each.
    pub fn step(&mut self) {
        let substeps = self.params.iterations_per_tick;
        let dt = self.params.dt / substeps as f32;
        for _ in 0..substeps {
            self.substep(dt);
        }

        let truncated = self.truncated_neighbors.swap(0, Ordering::Relaxed);
        if truncated > 0 {
            log::debug!(
                "tick {}: {} neighbors truncated to the per-particle cap",
                self.tick,
                truncated
            );
        }
        self.tick += 1;
    }

    /// One fixed four-phase substep. Each phase is a parallel pass whose
    /// join is the global barrier the next phase depends on: the hash is
    /// fully rebuilt before any neighbor query, and all forces are final
    /// before any position moves.
    fn substep(&mut self, dt: f32) {
        // Phase 1: external forces seed the force buffer.
        let gravity = self.params.gravity;
        self.forces.par_iter_mut().for_each(|f| *f = gravity);

        // Phase 2: rebuild the spatial index for current positions.
        self.hash
            .build(&self.particles, self.params.interaction_cutoff());

        // Phase 3: densities, then type-dispatched interaction forces.
        forces::density_pass(
            &mut self.particles,
            &self.hash,
            &self.coeffs,
            &mut self.densities,
            &mut self.near_densities,
            &self.truncated_neighbors,
        );
        forces::force_pass(
            &self.particles,
            &self.hash,
            &self.params,
            &self.coeffs,
            &self.obstacles,
            &mut self.forces,
            &self.truncated_neighbors,
        );

        // Phase 4: integrate and resolve wall contacts.
        integrate::integrate(&mut self.particles, &self.forces, &self.params, dt);
    }

    /// Replace the per-tick configuration. Re-validated; kernel coefficients
    /// are recomputed when the smoothing radius changes.
    pub fn set_params(&mut self, params: SimParams) -> Result<(), SimError> {
        params.validate()?;
        if params.smoothing_radius != self.params.smoothing_radius {
            self.coeffs = KernelCoeffs::new(params.smoothing_radius);
        }
        self.params = params;
        Ok(())
    }

    /// Refresh the obstacle set for the coming tick.
    pub fn set_obstacles(&mut self, obstacles: &[Obstacle]) {
        self.obstacles.clear();
        self.obstacles.extend_from_slice(obstacles);
    }

    /// Current configuration.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// The particle store. Only valid as a snapshot between completed ticks.
    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    /// Read-only render feed over `{position, velocity, kind}`.
    pub fn views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.particles.views()
    }

    /// Total particle count (fixed for the lifetime of the simulation).
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Completed tick count.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Domain box as (min, max) corners.
    pub fn bounds(&self) -> (glam::Vec3, glam::Vec3) {
        self.params.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn fluid_block(n_side: usize, spacing: f32, origin: Vec3) -> Vec<SpawnRecord> {
        let mut spawn = Vec::new();
        for i in 0..n_side {
            for j in 0..n_side {
                for k in 0..n_side {
                    spawn.push(SpawnRecord::new(
                        origin + Vec3::new(i as f32, j as f32, k as f32) * spacing,
                        Vec3::ZERO,
                        ParticleKind::Fluid,
                        MaterialProps::fluid(0.3, 1.0),
                    ));
                }
            }
        }
        spawn
    }

    #[test]
    fn test_empty_population_rejected() {
        assert!(matches!(
            Simulation::new(SimParams::default(), &[]),
            Err(SimError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_invalid_params_rejected_before_first_tick() {
        let params = SimParams {
            smoothing_radius: 0.0,
            ..Default::default()
        };
        let spawn = fluid_block(2, 0.1, Vec3::ZERO);
        assert!(Simulation::new(params, &spawn).is_err());
    }

    #[test]
    fn test_population_fixed_across_ticks() {
        let spawn = fluid_block(3, 0.1, Vec3::new(-0.1, 0.0, -0.1));
        let mut sim = Simulation::new(SimParams::default(), &spawn).unwrap();
        for _ in 0..5 {
            sim.step();
        }
        assert_eq!(sim.particle_count(), spawn.len());
        assert_eq!(sim.tick(), 5);
    }

    #[test]
    fn test_gravity_pulls_particles_down() {
        let spawn = fluid_block(2, 0.3, Vec3::new(0.0, 1.0, 0.0));
        let mut sim = Simulation::new(SimParams::default(), &spawn).unwrap();

        let initial_avg_y: f32 =
            spawn.iter().map(|r| r.position.y).sum::<f32>() / spawn.len() as f32;
        for _ in 0..30 {
            sim.step();
        }
        let avg_y: f32 = sim.views().map(|v| v.position.y).sum::<f32>() / spawn.len() as f32;
        assert!(
            avg_y < initial_avg_y,
            "particles should fall: {} -> {}",
            initial_avg_y,
            avg_y
        );
    }

    #[test]
    fn test_positions_stay_finite() {
        let spawn = fluid_block(4, 0.05, Vec3::ZERO);
        let mut sim = Simulation::new(SimParams::default(), &spawn).unwrap();
        for _ in 0..20 {
            sim.step();
        }
        for view in sim.views() {
            assert!(view.position.is_finite(), "position {:?}", view.position);
            assert!(view.velocity.is_finite(), "velocity {:?}", view.velocity);
        }
    }
}
