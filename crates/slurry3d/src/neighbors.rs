//! Bounded neighbor gather over the spatial hash.
//!
//! Visits the 3x3x3 cell block around a query position and filters candidates
//! by true Euclidean distance; the grid only approximates locality. Output is
//! a fixed-capacity buffer so per-lane work and memory stay predictable under
//! parallel dispatch. The returned *set* is deterministic, its *order* is not
//! (bucket layout depends on insertion order), so consumers must be pure
//! order-independent accumulations.

use glam::Vec3;

use crate::particle::Particles;
use crate::spatial_hash::SpatialHash;

/// Hard cap on neighbors considered per particle. Excess true neighbors under
/// dense packing are truncated by visit order — a documented approximation,
/// never a buffer overrun.
pub const MAX_NEIGHBORS: usize = 64;

/// Fixed-capacity neighbor list, stack-allocated per lane.
pub struct NeighborBuffer {
    indices: [u32; MAX_NEIGHBORS],
    len: usize,
    truncated: u32,
}

impl NeighborBuffer {
    pub fn new() -> Self {
        Self {
            indices: [0; MAX_NEIGHBORS],
            len: 0,
            truncated: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = 0;
    }

    /// Append an index; counts instead of storing once the cap is reached.
    #[inline]
    fn push(&mut self, index: u32) {
        if self.len < MAX_NEIGHBORS {
            self.indices[self.len] = index;
            self.len += 1;
        } else {
            self.truncated += 1;
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.indices[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True neighbors dropped because the cap was hit.
    #[inline]
    pub fn truncated(&self) -> u32 {
        self.truncated
    }
}

impl Default for NeighborBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `out` with the indices of particles within `radius` of `position`,
/// excluding `self_index`.
///
/// Distinct cells in the 3x3x3 block can alias to one bucket, so visited
/// bucket ids are deduplicated; without that a collision inside the block
/// would double-count every particle in the shared bucket.
pub fn gather(
    hash: &SpatialHash,
    particles: &Particles,
    position: Vec3,
    self_index: usize,
    radius: f32,
    out: &mut NeighborBuffer,
) {
    out.clear();
    let radius_sq = radius * radius;
    let home = hash.cell_of(position);

    let mut visited = [usize::MAX; 27];
    let mut visited_len = 0usize;

    for dz in -1..=1 {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let bucket = hash.bucket_of_cell(home + glam::IVec3::new(dx, dy, dz));
                if visited[..visited_len].contains(&bucket) {
                    continue;
                }
                visited[visited_len] = bucket;
                visited_len += 1;

                for &j in hash.bucket(bucket) {
                    if j as usize == self_index {
                        continue;
                    }
                    let d2 = (particles.list[j as usize].position - position).length_squared();
                    if d2 <= radius_sq {
                        out.push(j);
                    }
                }
            }
        }
    }
}
