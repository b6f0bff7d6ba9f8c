//! Hashed uniform grid for neighbor search.
//!
//! Space is partitioned into cells of side `cell_size` (the interaction
//! cutoff), so all neighbors of a particle lie in its home cell and the 26
//! surrounding ones. Cell coordinates are hashed into a fixed-size bucket
//! table; distinct cells may alias to the same bucket, which only makes the
//! neighbor walk visit a few extra particles — the Euclidean radius test
//! downstream is authoritative. The table is deliberately never grown to
//! resolve collisions.
//!
//! Buckets are materialized with a counting sort: per-bucket counts, an
//! exclusive prefix sum into `offsets`, then a scatter into `sorted_indices`,
//! so each bucket is the contiguous range
//! `sorted_indices[offsets[b]..offsets[b + 1]]`. All buffers are reused
//! across rebuilds; steady-state rebuilds allocate nothing.

use glam::{IVec3, Vec3};

use crate::particle::Particles;

// Large odd primes per axis, XOR-combined. Same family of constants as the
// usual GPU spatial-hash formulation.
const HASH_PRIME_X: u32 = 15823;
const HASH_PRIME_Y: u32 = 9_737_333;
const HASH_PRIME_Z: u32 = 440_817_757;

/// Rebuilt-every-step spatial index over the particle store.
pub struct SpatialHash {
    table_size: usize,
    cell_size: f32,
    inv_cell_size: f32,
    /// Particle count per bucket, then reused as scatter cursors.
    counts: Vec<u32>,
    /// Exclusive prefix sums; bucket b spans offsets[b]..offsets[b+1].
    offsets: Vec<u32>,
    /// Particle indices grouped by bucket.
    sorted_indices: Vec<u32>,
    /// Per-particle bucket id scratch.
    bucket_of: Vec<u32>,
}

impl SpatialHash {
    /// Pre-size the arena for a population of `capacity` particles.
    ///
    /// The bucket table is sized to roughly two buckets per particle so load
    /// stays low without the table tracking the domain extent.
    pub fn with_capacity(capacity: usize) -> Self {
        let table_size = (capacity * 2).next_power_of_two().max(64);
        Self {
            table_size,
            cell_size: 1.0,
            inv_cell_size: 1.0,
            counts: vec![0; table_size],
            offsets: vec![0; table_size + 1],
            sorted_indices: Vec::with_capacity(capacity),
            bucket_of: Vec::with_capacity(capacity),
        }
    }

    /// Cell coordinate containing `position` (floor per axis).
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        (position * self.inv_cell_size).floor().as_ivec3()
    }

    /// Bucket id for a cell coordinate.
    #[inline]
    pub fn bucket_of_cell(&self, cell: IVec3) -> usize {
        let hash = (cell.x as u32).wrapping_mul(HASH_PRIME_X)
            ^ (cell.y as u32).wrapping_mul(HASH_PRIME_Y)
            ^ (cell.z as u32).wrapping_mul(HASH_PRIME_Z);
        // table_size is a power of two, so masking is an exact modulo.
        (hash as usize) & (self.table_size - 1)
    }

    /// Particle indices in bucket `b`.
    #[inline]
    pub fn bucket(&self, b: usize) -> &[u32] {
        let start = self.offsets[b] as usize;
        let end = self.offsets[b + 1] as usize;
        &self.sorted_indices[start..end]
    }

    /// Cell size the index was last built with.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of buckets in the table.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Recompute the index from current particle positions.
    ///
    /// O(N + table). Clears and repopulates the existing buffers.
    pub fn build(&mut self, particles: &Particles, cell_size: f32) {
        debug_assert!(cell_size > 0.0 && cell_size.is_finite());
        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;

        let n = particles.len();
        self.bucket_of.clear();
        self.sorted_indices.clear();
        self.sorted_indices.resize(n, 0);
        self.counts.fill(0);

        // Pass 1: bucket id per particle + counts.
        for p in &particles.list {
            let bucket = self.bucket_of_cell(self.cell_of(p.position)) as u32;
            self.bucket_of.push(bucket);
            self.counts[bucket as usize] += 1;
        }

        // Pass 2: exclusive prefix sum.
        let mut running = 0u32;
        for b in 0..self.table_size {
            self.offsets[b] = running;
            running += self.counts[b];
        }
        self.offsets[self.table_size] = running;

        // Pass 3: scatter, reusing `counts` as per-bucket cursors.
        self.counts.copy_from_slice(&self.offsets[..self.table_size]);
        for (i, &bucket) in self.bucket_of.iter().enumerate() {
            let slot = self.counts[bucket as usize];
            self.sorted_indices[slot as usize] = i as u32;
            self.counts[bucket as usize] = slot + 1;
        }
    }
}
