//! Neighbor search equivalence tests.
//!
//! The spatial hash plus the 27-cell gather must find exactly the neighbors
//! a brute-force O(N^2) distance scan finds, for populations comfortably
//! under the truncation cap.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slurry3d::{
    neighbors, MaterialProps, NeighborBuffer, ParticleKind, Particles, SpatialHash, SpawnRecord,
};

fn random_population(n: usize, seed: u64, extent: f32) -> Particles {
    let mut rng = StdRng::seed_from_u64(seed);
    let spawn: Vec<_> = (0..n)
        .map(|i| {
            let pos = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            let kind = if i % 3 == 0 {
                ParticleKind::Sand
            } else {
                ParticleKind::Fluid
            };
            SpawnRecord::new(pos, Vec3::ZERO, kind, MaterialProps::default())
        })
        .collect();
    Particles::from_spawn(&spawn)
}

fn brute_force_neighbors(particles: &Particles, i: usize, radius: f32) -> Vec<u32> {
    let pos = particles.list[i].position;
    let radius_sq = radius * radius;
    let mut found: Vec<u32> = particles
        .list
        .iter()
        .enumerate()
        .filter(|(j, q)| *j != i && (q.position - pos).length_squared() <= radius_sq)
        .map(|(j, _)| j as u32)
        .collect();
    found.sort_unstable();
    found
}

#[test]
fn test_hash_matches_brute_force() {
    let radius = 0.25;
    let particles = random_population(400, 7, 1.2);
    let mut hash = SpatialHash::with_capacity(particles.len());
    hash.build(&particles, radius);

    let mut buf = NeighborBuffer::new();
    for i in 0..particles.len() {
        neighbors::gather(
            &hash,
            &particles,
            particles.list[i].position,
            i,
            radius,
            &mut buf,
        );
        let mut from_hash: Vec<u32> = buf.as_slice().to_vec();
        from_hash.sort_unstable();

        let expected = brute_force_neighbors(&particles, i, radius);
        assert_eq!(
            from_hash, expected,
            "neighbor set mismatch for particle {}",
            i
        );
        assert_eq!(buf.truncated(), 0, "population should sit under the cap");
    }
}

#[test]
fn test_hash_matches_brute_force_with_larger_cells() {
    // Cell size above the query radius: the 3x3x3 block still covers the
    // support, the radius test discards the extra candidates.
    let radius = 0.2;
    let particles = random_population(200, 11, 0.8);
    let mut hash = SpatialHash::with_capacity(particles.len());
    hash.build(&particles, radius * 1.7);

    let mut buf = NeighborBuffer::new();
    for i in 0..particles.len() {
        neighbors::gather(
            &hash,
            &particles,
            particles.list[i].position,
            i,
            radius,
            &mut buf,
        );
        let mut from_hash: Vec<u32> = buf.as_slice().to_vec();
        from_hash.sort_unstable();
        assert_eq!(from_hash, brute_force_neighbors(&particles, i, radius));
    }
}

#[test]
fn test_rebuild_tracks_motion() {
    let radius = 0.3;
    let mut particles = random_population(150, 23, 1.0);
    let mut hash = SpatialHash::with_capacity(particles.len());

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..5 {
        for p in &mut particles.list {
            p.position += Vec3::new(
                rng.gen_range(-0.1..0.1),
                rng.gen_range(-0.1..0.1),
                rng.gen_range(-0.1..0.1),
            );
        }
        hash.build(&particles, radius);

        let mut buf = NeighborBuffer::new();
        for i in 0..particles.len() {
            neighbors::gather(
                &hash,
                &particles,
                particles.list[i].position,
                i,
                radius,
                &mut buf,
            );
            let mut from_hash: Vec<u32> = buf.as_slice().to_vec();
            from_hash.sort_unstable();
            assert_eq!(from_hash, brute_force_neighbors(&particles, i, radius));
        }
    }
}
