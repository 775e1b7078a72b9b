//! # World Generation
//!
//! Generators produce block data for columns that have never been stored. The
//! streaming pipeline only calls a generator after the region store reported
//! that it has nothing for a coordinate.
//!
//! Every generator is deterministic for a given coordinate, so regenerating a
//! column that was evicted without being saved gives the same blocks back.

use cgmath::{Point2, Point3};
use noise::{NoiseFn, Perlin};

use super::{
    block::{
        block_type::{AIR, DIRT, STONE},
        BlockId,
    },
    chunk::{chunk_creation::ChunkCreationIterator, VoxelChunk},
    column::{ChunkColumn, COLUMN_HEIGHT},
};
use crate::engine_state::error::GenerationError;

/// Produces block data for never-before-seen chunks.
pub trait WorldGenerator: Send {
    /// Generates the chunk at `position` (chunk coordinates).
    fn generate_chunk(&self, position: Point3<i32>) -> Result<VoxelChunk, GenerationError>;

    /// Generates every chunk of a column, bottom to top.
    fn generate_column(&self, position: Point2<i32>) -> Result<ChunkColumn, GenerationError> {
        let chunks = (0..COLUMN_HEIGHT as i32)
            .map(|z| self.generate_chunk(Point3::new(position.x, position.y, z)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChunkColumn::from_chunks(position, chunks))
    }
}

/// Fills a chunk cell by cell from a function of the world block coordinate.
fn fill_chunk(position: Point3<i32>, mut block_at: impl FnMut(Point3<i32>) -> BlockId) -> VoxelChunk {
    let mut cci = ChunkCreationIterator::new(position);
    while cci.current_cell().is_some() {
        let block = block_at(cci.current_world_block());
        cci.push_block(block);
    }
    cci.return_chunk()
}

/// A generator for worlds that must never create new terrain.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableGenerator;

impl WorldGenerator for UnavailableGenerator {
    fn generate_chunk(&self, _position: Point3<i32>) -> Result<VoxelChunk, GenerationError> {
        Err(GenerationError::NotYetAvailable)
    }
}

/// Flat terrain: `fill` below the surface layer, `surface` on top, air above.
#[derive(Debug, Clone, Copy)]
pub struct FlatGenerator {
    /// World block height of the first air layer
    pub ground_height: i32,
    pub fill: BlockId,
    pub surface: BlockId,
}

impl Default for FlatGenerator {
    fn default() -> Self {
        FlatGenerator {
            ground_height: 64,
            fill: STONE.id,
            surface: DIRT.id,
        }
    }
}

impl WorldGenerator for FlatGenerator {
    fn generate_chunk(&self, position: Point3<i32>) -> Result<VoxelChunk, GenerationError> {
        Ok(fill_chunk(position, |block| {
            if block.z < self.ground_height - 1 {
                self.fill
            } else if block.z == self.ground_height - 1 {
                self.surface
            } else {
                AIR.id
            }
        }))
    }
}

/// Threshold above which Perlin noise is considered solid.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered solid.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Cave-like terrain from 3D Perlin noise.
///
/// Cells whose noise sample falls outside
/// `[PERLIN_NEGATIVE_THRESHOLD, PERLIN_POSITIVE_THRESHOLD]` become stone or dirt;
/// the rest stays air. Which of the two solid blocks is used is decided by a
/// second, coarser noise layer so the result does not depend on call order.
pub struct PerlinGenerator {
    perlin: Perlin,
    material: Perlin,
    scale: f64,
}

impl PerlinGenerator {
    pub fn new(seed: u32) -> Self {
        PerlinGenerator {
            perlin: Perlin::new(seed),
            material: Perlin::new(seed.wrapping_add(1)),
            scale: PERLIN_SCALE_FACTOR,
        }
    }

    /// Converts a world block coordinate into a noise sample position.
    fn to_perlin_pos(pos: Point3<i32>, scale_factor: f64) -> [f64; 3] {
        [
            pos.x as f64 * scale_factor,
            pos.y as f64 * scale_factor,
            pos.z as f64 * scale_factor,
        ]
    }
}

impl WorldGenerator for PerlinGenerator {
    fn generate_chunk(&self, position: Point3<i32>) -> Result<VoxelChunk, GenerationError> {
        Ok(fill_chunk(position, |block| {
            let sample = self.perlin.get(Self::to_perlin_pos(block, self.scale));
            if (PERLIN_NEGATIVE_THRESHOLD..=PERLIN_POSITIVE_THRESHOLD).contains(&sample) {
                AIR.id
            } else if self.material.get(Self::to_perlin_pos(block, self.scale * 4.0)) > 0.0 {
                DIRT.id
            } else {
                STONE.id
            }
        }))
    }
}

/// Scatters one block type randomly with a fixed density.
///
/// The random stream is seeded from the world seed and the chunk coordinate, so
/// each chunk always gets the same blocks.
#[derive(Debug, Clone, Copy)]
pub struct ScatterGenerator {
    pub seed: u64,
    /// Probability in `[0, 1]` that a cell holds `block`
    pub density: f64,
    pub block: BlockId,
}

impl ScatterGenerator {
    fn chunk_seed(&self, position: Point3<i32>) -> u64 {
        let mut seed = self.seed;
        for axis in [position.x, position.y, position.z] {
            seed = seed.rotate_left(21) ^ (axis as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        }
        seed
    }
}

impl WorldGenerator for ScatterGenerator {
    fn generate_chunk(&self, position: Point3<i32>) -> Result<VoxelChunk, GenerationError> {
        if !(0.0..=1.0).contains(&self.density) {
            return Err(GenerationError::Failed {
                position,
                reason: format!("density {} is not a probability", self.density),
            });
        }

        let mut rng = fastrand::Rng::with_seed(self.chunk_seed(position));
        Ok(fill_chunk(position, |_| {
            if rng.f64() < self.density {
                self.block
            } else {
                AIR.id
            }
        }))
    }
}
