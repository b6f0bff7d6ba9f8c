//! Per-tick solver configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// All tunables consumed by the solver each tick.
///
/// Validated once at construction and on every `set_params`; the hot path
/// assumes every field is finite and in range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SimParams {
    /// Tick duration in seconds. Each tick runs `iterations_per_tick`
    /// substeps of `dt / iterations_per_tick`.
    pub dt: f32,
    /// Gravity acceleration, applied to every particle before type dispatch.
    pub gravity: Vec3,

    /// SPH support radius `h`.
    pub smoothing_radius: f32,
    /// Rest density the pressure term relaxes toward.
    pub target_density: f32,
    /// Global pressure constant `k` (scaled per particle by its material).
    pub pressure_multiplier: f32,
    /// Near-pressure constant `k_near` for the repulsive short-range term.
    pub near_pressure_multiplier: f32,
    /// Global scale on per-particle viscosity.
    pub viscosity_strength: f32,

    /// Physical particle radius (granular geometry).
    pub particle_radius: f32,
    /// Center-to-center distance below which sand contacts engage.
    pub stacking_distance: f32,
    /// Spring stiffness of the sand penalty contact.
    pub contact_stiffness: f32,
    /// Bulk velocity damping applied to sand, per second.
    pub sand_friction_damping: f32,

    /// Hard speed cap applied after the velocity update. A stability
    /// safeguard against stiff penalty forces, not a physical law.
    pub max_speed: f32,

    /// Center of the axis-aligned domain box.
    pub bounds_center: Vec3,
    /// Full extent of the domain box.
    pub bounds_size: Vec3,

    /// Substeps per tick.
    pub iterations_per_tick: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -10.0, 0.0),
            smoothing_radius: 0.2,
            target_density: 630.0,
            pressure_multiplier: 288.0,
            near_pressure_multiplier: 2.25,
            viscosity_strength: 0.08,
            particle_radius: 0.05,
            stacking_distance: 0.1,
            contact_stiffness: 2000.0,
            sand_friction_damping: 3.0,
            max_speed: 20.0,
            bounds_center: Vec3::ZERO,
            bounds_size: Vec3::new(4.0, 6.0, 4.0),
            iterations_per_tick: 3,
        }
    }
}

impl SimParams {
    /// Fail fast on configuration that would poison the solver. Called before
    /// any tick runs.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("dt", self.dt),
            ("smoothing_radius", self.smoothing_radius),
            ("target_density", self.target_density),
            ("particle_radius", self.particle_radius),
            ("max_speed", self.max_speed),
            ("bounds_size.x", self.bounds_size.x),
            ("bounds_size.y", self.bounds_size.y),
            ("bounds_size.z", self.bounds_size.z),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SimError::InvalidParameter { name, value });
            }
        }

        let finite_non_negative = [
            ("pressure_multiplier", self.pressure_multiplier),
            ("near_pressure_multiplier", self.near_pressure_multiplier),
            ("viscosity_strength", self.viscosity_strength),
            ("stacking_distance", self.stacking_distance),
            ("contact_stiffness", self.contact_stiffness),
            ("sand_friction_damping", self.sand_friction_damping),
        ];
        for (name, value) in finite_non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SimError::InvalidParameter { name, value });
            }
        }

        if !self.gravity.is_finite() || !self.bounds_center.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "gravity/bounds_center",
                value: f32::NAN,
            });
        }

        if self.iterations_per_tick == 0 {
            return Err(SimError::InvalidParameter {
                name: "iterations_per_tick",
                value: 0.0,
            });
        }

        Ok(())
    }

    /// Interaction cutoff: one spatial hash serves both force paths, so the
    /// cell size must cover the larger of the two supports.
    #[inline]
    pub fn interaction_cutoff(&self) -> f32 {
        self.smoothing_radius.max(self.stacking_distance)
    }

    /// Domain box as (min, max) corners.
    #[inline]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = self.bounds_size * 0.5;
        (self.bounds_center - half, self.bounds_center + half)
    }
}
