//! Headless dam-break diagnostic.
//!
//! A block of fluid spawned in one corner collapses under gravity and sloshes
//! across the domain. Prints per-interval height and speed metrics.

use glam::Vec3;
use slurry3d::{MaterialProps, ParticleKind, SimParams, Simulation, SpawnRecord};

fn main() {
    env_logger::init();
    println!("=== DAM BREAK DIAGNOSTIC ===\n");

    let params = SimParams::default();
    let (bounds_min, _) = params.bounds();
    let spacing = params.smoothing_radius * 0.5;

    let mut spawn = Vec::new();
    for i in 0..12 {
        for j in 0..20 {
            for k in 0..12 {
                spawn.push(SpawnRecord::new(
                    bounds_min
                        + Vec3::new(0.1, 0.1, 0.1)
                        + Vec3::new(i as f32, j as f32, k as f32) * spacing,
                    Vec3::ZERO,
                    ParticleKind::Fluid,
                    MaterialProps::fluid(0.3, 1.0),
                ));
            }
        }
    }

    let mut sim = Simulation::new(params, &spawn).expect("valid configuration");
    println!("{} particles, dt = {:.4}", sim.particle_count(), params.dt);

    for frame in 0..240 {
        sim.step();

        if frame % 20 == 0 {
            let n = sim.particle_count() as f32;
            let avg_y: f32 = sim.views().map(|v| v.position.y).sum::<f32>() / n;
            let max_speed: f32 = sim
                .views()
                .map(|v| v.velocity.length())
                .fold(0.0, f32::max);
            let spread_x: f32 = sim.views().map(|v| v.position.x).fold(f32::MIN, f32::max)
                - sim.views().map(|v| v.position.x).fold(f32::MAX, f32::min);
            println!(
                "frame {:3}: avg_y={:7.3}  spread_x={:6.3}  max|v|={:6.3}",
                frame, avg_y, spread_x, max_speed
            );
        }
    }

    let settled: f32 =
        sim.views().map(|v| v.velocity.length()).sum::<f32>() / sim.particle_count() as f32;
    println!("\nfinal avg speed: {:.4}", settled);
}
