//! Mixed-type particle store.
//!
//! One dense array-of-structs holds both fluid and sand particles so a single
//! neighbor search and a single step loop can serve both materials. Indices
//! are stable within a run (the population is fixed after spawn) but carry no
//! identity across runs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Material kind. Immutable after spawn; selects the force model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Incompressible fluid, solved with SPH (density, pressure, viscosity).
    Fluid,
    /// Granular material, solved with penalty contacts and friction damping.
    Sand,
}

impl ParticleKind {
    /// Is this a granular particle?
    #[inline]
    pub fn is_sand(self) -> bool {
        matches!(self, Self::Sand)
    }
}

/// Per-particle material properties, fixed at spawn.
///
/// Semantics depend on the particle kind: `friction` and `restitution` drive
/// the sand contact and wall response, `viscosity` and `pressure_multiplier`
/// scale the fluid force terms. The unused pair is simply ignored.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MaterialProps {
    /// Contact stiffness proxy and tangential damping scale (Sand).
    pub friction: f32,
    /// Fraction of velocity retained on a wall bounce (Sand).
    pub restitution: f32,
    /// Velocity-diffusion coefficient (Fluid).
    pub viscosity: f32,
    /// Per-particle scale on the global pressure constant (Fluid).
    pub pressure_multiplier: f32,
}

impl MaterialProps {
    /// Typical fluid material.
    pub fn fluid(viscosity: f32, pressure_multiplier: f32) -> Self {
        Self {
            friction: 0.0,
            restitution: 0.0,
            viscosity,
            pressure_multiplier,
        }
    }

    /// Typical sand material.
    pub fn sand(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
            viscosity: 0.0,
            pressure_multiplier: 0.0,
        }
    }
}

impl Default for MaterialProps {
    fn default() -> Self {
        Self::fluid(0.5, 1.0)
    }
}

/// One particle. Density fields are recomputed every step for fluid
/// particles and are meaningless for sand.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// World position. Written only by the integration phase.
    pub position: Vec3,
    /// Velocity. Written only by the integration phase.
    pub velocity: Vec3,
    /// SPH density (Fluid only).
    pub density: f32,
    /// SPH near-density, short-range anti-clustering term (Fluid only).
    pub near_density: f32,
    /// Material kind, immutable after spawn.
    pub kind: ParticleKind,
    /// Material properties, immutable after spawn.
    pub props: MaterialProps,
}

/// External spawn-feed record, supplied once before the first tick.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub position: Vec3,
    pub velocity: Vec3,
    pub kind: ParticleKind,
    pub props: MaterialProps,
}

impl SpawnRecord {
    pub fn new(position: Vec3, velocity: Vec3, kind: ParticleKind, props: MaterialProps) -> Self {
        Self {
            position,
            velocity,
            kind,
            props,
        }
    }
}

/// Read-only render feed: what an external rasterizer is allowed to see.
#[derive(Clone, Copy, Debug)]
pub struct ParticleView {
    pub position: Vec3,
    pub velocity: Vec3,
    pub kind: ParticleKind,
}

/// The unified particle population. Created once from spawn data; no particle
/// is added or removed mid-run.
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    /// Build the store from externally supplied spawn records.
    pub fn from_spawn(spawn: &[SpawnRecord]) -> Self {
        let list = spawn
            .iter()
            .map(|record| Particle {
                position: record.position,
                velocity: record.velocity,
                density: 0.0,
                near_density: 0.0,
                kind: record.kind,
                props: record.props,
            })
            .collect();
        Self { list }
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Snapshot iterator for the render feed. Only valid between completed
    /// ticks, never mid-step.
    pub fn views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.list.iter().map(|p| ParticleView {
            position: p.position,
            velocity: p.velocity,
            kind: p.kind,
        })
    }
}
