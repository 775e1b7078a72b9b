//! # Block Module
//!
//! This module provides the block catalog for the voxel world: the immutable
//! description of each voxel type, the face orientations used during meshing and
//! the registry that maps block ids to their catalog entries.

use serde::{Deserialize, Serialize};

pub mod block_side;
pub mod block_type;
pub mod registry;

pub use registry::BlockRegistry;

/// The integer type used to reference a block type from a chunk grid.
pub type BlockId = u32;

/// The id every freshly created chunk is filled with.
pub const AIR_BLOCK_ID: BlockId = 0;

/// Immutable description of one voxel type.
///
/// Entries are created once when they are registered and never change afterwards.
/// Chunks only store the `id`; solidity and transparency are looked up through the
/// registry when a mesh is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCatalogEntry {
    /// Unique id of the block within its registry.
    pub id: BlockId,
    /// Short name, e.g. `BlockStone`.
    pub name: String,
    /// Whether the block takes part in collision.
    pub solid: bool,
    /// Whether faces behind this block stay visible.
    pub transparent: bool,
}

impl BlockCatalogEntry {
    /// Creates a new catalog entry.
    pub fn new(id: BlockId, name: impl Into<String>, solid: bool, transparent: bool) -> Self {
        BlockCatalogEntry {
            id,
            name: name.into(),
            solid,
            transparent,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}
