//! Headless sand-pile diagnostic.
//!
//! Drops a column of sand onto the floor next to a box obstacle and reports
//! how quickly the pile comes to rest.

use glam::Vec3;
use slurry3d::{MaterialProps, Obstacle, ParticleKind, SimParams, Simulation, SpawnRecord};

fn main() {
    env_logger::init();
    println!("=== SAND PILE DIAGNOSTIC ===\n");

    let params = SimParams::default();
    let (bounds_min, _) = params.bounds();
    let spacing = params.stacking_distance * 0.9;

    let mut spawn = Vec::new();
    for i in 0..6 {
        for j in 0..24 {
            for k in 0..6 {
                spawn.push(SpawnRecord::new(
                    Vec3::new(
                        (i as f32 - 2.5) * spacing,
                        bounds_min.y + 0.8 + j as f32 * spacing,
                        (k as f32 - 2.5) * spacing,
                    ),
                    Vec3::ZERO,
                    ParticleKind::Sand,
                    MaterialProps::sand(0.6, 0.1),
                ));
            }
        }
    }

    let mut sim = Simulation::new(params, &spawn).expect("valid configuration");
    sim.set_obstacles(&[Obstacle::new(
        Vec3::new(0.6, bounds_min.y + 0.3, 0.0),
        Vec3::new(0.3, 0.3, 0.8),
        Vec3::ZERO,
    )]);

    println!("{} grains, dt = {:.4}", sim.particle_count(), params.dt);

    let rest_threshold = 0.05;
    for frame in 0..360 {
        sim.step();

        let n = sim.particle_count() as f32;
        let avg_speed: f32 = sim.views().map(|v| v.velocity.length()).sum::<f32>() / n;
        let resting = sim
            .views()
            .filter(|v| v.velocity.length() < rest_threshold)
            .count();

        if frame % 30 == 0 {
            let max_y: f32 = sim.views().map(|v| v.position.y).fold(f32::MIN, f32::max);
            println!(
                "frame {:3}: avg|v|={:6.3}  resting={:4}/{:4}  pile_top={:6.3}",
                frame,
                avg_speed,
                resting,
                sim.particle_count(),
                max_y - bounds_min.y
            );
        }

        if resting == sim.particle_count() {
            println!("\npile at rest after {} frames", frame + 1);
            return;
        }
    }
    println!("\npile still moving after 360 frames");
}
